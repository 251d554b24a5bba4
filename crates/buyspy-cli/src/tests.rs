use super::*;

#[test]
fn parses_find_with_defaults() {
    let cli = Cli::try_parse_from(["buyspy", "find", "Philips TAH9505"])
        .expect("expected valid cli args");

    let Some(Commands::Find {
        product,
        country,
        max_candidates,
        compact,
    }) = cli.command
    else {
        panic!("expected find command");
    };
    assert_eq!(product, "Philips TAH9505");
    assert_eq!(country, "FI");
    assert_eq!(max_candidates, None);
    assert!(!compact);
}

#[test]
fn parses_find_with_country_and_limit() {
    let cli = Cli::try_parse_from([
        "buyspy",
        "find",
        "Sony WF-C510",
        "--country",
        "de",
        "--max-candidates",
        "5",
        "--compact",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Find {
            ref country,
            max_candidates: Some(5),
            compact: true,
            ..
        }) if country == "de"
    ));
}

#[test]
fn find_requires_a_product() {
    assert!(Cli::try_parse_from(["buyspy", "find"]).is_err());
}

#[test]
fn find_rejects_non_numeric_limit() {
    let result = Cli::try_parse_from(["buyspy", "find", "TAH9505", "--max-candidates", "ten"]);
    assert!(result.is_err());
}

#[test]
fn parses_classify_with_several_domains() {
    let cli = Cli::try_parse_from([
        "buyspy",
        "classify",
        "power.fi",
        "https://www.amazon.de/dp/B0",
        "--country",
        "DE",
    ])
    .expect("expected valid cli args");

    let Some(Commands::Classify { domains, country }) = cli.command else {
        panic!("expected classify command");
    };
    assert_eq!(domains.len(), 2);
    assert_eq!(country, "DE");
}

#[test]
fn classify_requires_a_domain() {
    assert!(Cli::try_parse_from(["buyspy", "classify"]).is_err());
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["buyspy"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn domain_of_accepts_urls_and_bare_hosts() {
    assert_eq!(find::domain_of("https://www.power.fi/p/1"), "power.fi");
    assert_eq!(find::domain_of("shop.currys.co.uk"), "currys.co.uk");
    assert_eq!(find::domain_of(" WWW.Gigantti.fi "), "gigantti.fi");
}
