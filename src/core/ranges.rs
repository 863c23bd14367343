use crate::core::config::Config;
use crate::core::errors::{Error, Result};
use crate::core::feed::{fetch_feed, FeedSource};
use crate::core::prefix_set::PrefixSet;
use ipnetwork::IpNetwork;
use log::{debug, info, warn};

/*-------------------------------------------------------------------------------------------------
  Compute API Ranges
-------------------------------------------------------------------------------------------------*/

/// Compute `all` minus `excluded` as the minimal, ascending list of CIDR blocks.
///
/// ```
/// use ipnetwork::IpNetwork;
///
/// let all: Vec<IpNetwork> = vec!["10.0.0.0/8".parse().unwrap(), "172.16.0.0/12".parse().unwrap()];
/// let excluded: Vec<IpNetwork> = vec!["10.0.0.0/9".parse().unwrap()];
///
/// let ranges: Vec<String> = googleapiips::compute(&all, &excluded)
///     .iter()
///     .map(|range| range.to_string())
///     .collect();
/// assert_eq!(ranges, vec!["10.128.0.0/9", "172.16.0.0/12"]);
/// ```
pub fn compute(all: &[IpNetwork], excluded: &[IpNetwork]) -> Vec<IpNetwork> {
    if excluded.is_empty() {
        warn!("No excluded ranges; the result is every input range re-aggregated");
    }

    let all = PrefixSet::from_networks(all);
    let outside = outside_of(&all, excluded);
    if !outside.is_empty() {
        debug!(
            "{} excluded prefixes reach outside the full range list: {:?}",
            outside.len(),
            outside
        );
    }

    let excluded = PrefixSet::from_networks(excluded);
    let api_ranges = all.difference(&excluded);

    debug!(
        "IPv4 addresses: {} total, {} excluded, {} remaining",
        all.ipv4_address_count(),
        excluded.ipv4_address_count(),
        api_ranges.ipv4_address_count()
    );

    api_ranges.cidrs()
}

/// Excluded prefixes that are not entirely inside the full set.
fn outside_of(all: &PrefixSet, excluded: &[IpNetwork]) -> Vec<IpNetwork> {
    excluded
        .iter()
        .filter(|network| !all.contains(network))
        .copied()
        .collect()
}

/*-------------------------------------------------------------------------------------------------
  Get API Ranges
-------------------------------------------------------------------------------------------------*/

/// Retrieve both feeds named in the [Config] and compute the ranges used by Google APIs and
/// services. Both feeds must be retrieved and contain prefixes; an empty result is an error.
pub fn get_api_ranges<S: FeedSource + ?Sized>(config: &Config, source: &S) -> Result<Vec<IpNetwork>> {
    debug!("Getting Google API IPs");

    let all = fetch_feed(source, config.all_ranges_url())?;
    let excluded = fetch_feed(source, config.excluded_ranges_url())?;

    let api_ranges = compute(&all.prefixes, &excluded.prefixes);
    if api_ranges.is_empty() {
        return Err(Error::Ranges(format!(
            "every range in {} is also listed in {}",
            config.all_ranges_url(),
            config.excluded_ranges_url()
        )));
    }

    let ipv4_count = api_ranges.iter().filter(|range| range.is_ipv4()).count();
    info!(
        "Computed {} API CIDR blocks ({} IPv4, {} IPv6)",
        api_ranges.len(),
        ipv4_count,
        api_ranges.len() - ipv4_count
    );

    Ok(api_ranges)
}

/*-------------------------------------------------------------------------------------------------
  Unit Tests
-------------------------------------------------------------------------------------------------*/

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ConfigBuilder;
    use crate::core::feed::tests::StaticFeedSource;
    use crate::core::prefix_set::tests::networks;
    use test_log::test;

    const ALL_URL: &str = "https://feeds.example.com/goog.json";
    const EXCLUDED_URL: &str = "https://feeds.example.com/cloud.json";

    fn test_config() -> Config {
        ConfigBuilder::default()
            .all_ranges_url(ALL_URL)
            .excluded_ranges_url(EXCLUDED_URL)
            .update_fw_alias(false)
            .build()
            .unwrap()
    }

    fn strings(ranges: &[IpNetwork]) -> Vec<String> {
        ranges.iter().map(|range| range.to_string()).collect()
    }

    /*----------------------------------------------------------------------------------
      Compute
    ----------------------------------------------------------------------------------*/

    #[test]
    fn test_compute() {
        let all = networks(&["10.0.0.0/8", "172.16.0.0/12"]);
        let excluded = networks(&["10.0.0.0/9"]);
        assert_eq!(
            strings(&compute(&all, &excluded)),
            vec!["10.128.0.0/9", "172.16.0.0/12"]
        );
    }

    #[test]
    fn test_compute_covers_exact_difference() {
        let all = networks(&["8.8.4.0/24", "8.8.8.0/24", "8.34.208.0/20", "2001:4860::/32"]);
        let excluded = networks(&["8.34.208.0/23", "8.34.220.0/22", "2001:4860:8000::/33"]);
        let result = compute(&all, &excluded);

        let all = PrefixSet::from_networks(&all);
        let excluded = PrefixSet::from_networks(&excluded);
        let result_set = PrefixSet::from_networks(&result);

        assert_eq!(result_set, all.difference(&excluded));
        assert!(result_set.difference(&all).is_empty());
        assert_eq!(result_set.difference(&excluded), result_set);
        assert_eq!(
            strings(&result),
            vec![
                "8.8.4.0/24",
                "8.8.8.0/24",
                "8.34.210.0/23",
                "8.34.212.0/22",
                "8.34.216.0/22",
                "2001:4860::/33"
            ]
        );
    }

    #[test]
    fn test_compute_is_idempotent() {
        let all = networks(&["34.0.0.0/15", "35.190.0.0/17", "2600:1900::/28"]);
        let excluded = networks(&["34.1.0.0/20", "35.190.64.0/19", "2600:1900:4000::/44"]);
        let once = compute(&all, &excluded);
        let twice = compute(&once, &[]);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_compute_without_exclusions_reaggregates() {
        let all = networks(&["10.0.0.0/9", "10.128.0.0/9", "10.1.0.0/16"]);
        assert_eq!(strings(&compute(&all, &[])), vec!["10.0.0.0/8"]);
    }

    #[test]
    fn test_excluded_prefixes_outside_of_all() {
        let all = PrefixSet::from_networks(&networks(&["10.0.0.0/8", "2001:db8::/32"]));
        let excluded = networks(&["10.1.0.0/16", "192.168.0.0/16", "2001:db8::/31"]);
        assert_eq!(
            strings(&outside_of(&all, &excluded)),
            vec!["192.168.0.0/16", "2001:db8::/31"]
        );
    }

    /*----------------------------------------------------------------------------------
      Get API Ranges
    ----------------------------------------------------------------------------------*/

    #[test]
    fn test_get_api_ranges() {
        let source = StaticFeedSource::default()
            .with_prefixes(ALL_URL, &["10.0.0.0/8", "172.16.0.0/12"])
            .with_prefixes(EXCLUDED_URL, &["10.0.0.0/9"]);

        let ranges = get_api_ranges(&test_config(), &source).unwrap();
        assert_eq!(strings(&ranges), vec!["10.128.0.0/9", "172.16.0.0/12"]);
    }

    #[test]
    fn test_get_api_ranges_empty_excluded_feed_is_an_error() {
        let source = StaticFeedSource::default()
            .with_prefixes(ALL_URL, &["10.0.0.0/8"])
            .with(EXCLUDED_URL, r#"{"prefixes": []}"#);

        let error = get_api_ranges(&test_config(), &source).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[test]
    fn test_get_api_ranges_malformed_excluded_feed_is_an_error() {
        let source = StaticFeedSource::default()
            .with_prefixes(ALL_URL, &["10.0.0.0/8"])
            .with(EXCLUDED_URL, r#"{"syncToken": "1"}"#);

        let error = get_api_ranges(&test_config(), &source).unwrap_err();
        assert!(matches!(error, Error::Parse { .. }));
    }

    #[test]
    fn test_get_api_ranges_stops_after_first_failure() {
        let source = StaticFeedSource::default().with_prefixes(EXCLUDED_URL, &["10.0.0.0/9"]);

        let error = get_api_ranges(&test_config(), &source).unwrap_err();
        assert!(matches!(error, Error::Fetch { .. }));
        assert_eq!(source.requests.borrow().as_slice(), [ALL_URL.to_string()]);
    }

    #[test]
    fn test_get_api_ranges_empty_result_is_an_error() {
        let source = StaticFeedSource::default()
            .with_prefixes(ALL_URL, &["10.0.0.0/9"])
            .with_prefixes(EXCLUDED_URL, &["10.0.0.0/8"]);

        let error = get_api_ranges(&test_config(), &source).unwrap_err();
        assert!(matches!(error, Error::Ranges(_)));
    }
}
