use mockall::automock;

use dpsync_core::client::DataPowerClient;
use dpsync_core::types::{DomainName, RemoteFolderPath};

use crate::error::Error;

pub const EXIT_OPTION: &str = "Exit";

/// "Choose one of N options" capability. `None` means the selection was
/// cancelled.
#[automock]
pub trait FolderSelector {
    fn select(&self, prompt: &str, options: &[String]) -> Option<String>;
}

/// The API can decorate entry names with their location prefix
/// ("local:/realname/") : keep only the segment itself.
pub fn sanitize_segment(raw: &str) -> String {
    let without_prefix = match raw.find('/') {
        Some(position) => &raw[position + 1..],
        None => raw,
    };
    without_prefix.trim_end_matches('/').to_string()
}

pub fn choose_domain(
    client: &dyn DataPowerClient,
    selector: &dyn FolderSelector,
) -> Result<DomainName, Error> {
    let domains = client.domains()?;
    let options: Vec<String> = domains.into_iter().map(|domain| domain.0).collect();
    let domain = selector
        .select("Select a domain", &options)
        .ok_or_else(|| Error::StartupError("No domain selected".to_string()))?;
    Ok(DomainName(domain))
}

pub fn choose_location(
    client: &dyn DataPowerClient,
    selector: &dyn FolderSelector,
    domain: &DomainName,
) -> Result<RemoteFolderPath, Error> {
    let locations = client.locations(domain)?;
    let location = selector
        .select("Select a filestore location", &locations)
        .ok_or_else(|| Error::StartupError("No filestore location selected".to_string()))?;
    Ok(RemoteFolderPath::new(location.trim_end_matches(':')))
}

/// Walk the remote folder tree by sequential picks and return the resolved
/// path. Never fails : a listing error steps back to the parent as
/// best-known path.
pub fn resolve_folder(
    client: &dyn DataPowerClient,
    selector: &dyn FolderSelector,
    domain: &DomainName,
    start: RemoteFolderPath,
) -> RemoteFolderPath {
    let mut current = start;

    loop {
        let subfolders = match client.list_directory(domain, &current) {
            Ok(subfolders) => subfolders,
            Err(error) => {
                log::warn!("Error when listing subfolders of {} : '{}'", current, error);
                return current.parent();
            }
        };

        if subfolders.is_empty() {
            log::info!("No subfolders found in {}", current);
            return current;
        }

        let mut options = subfolders;
        options.push(EXIT_OPTION.to_string());
        let prompt = format!(
            "Select a folder in {} or choose '{}' to stop",
            current, EXIT_OPTION,
        );
        match selector.select(&prompt, &options) {
            None => return current,
            Some(choice) if choice == EXIT_OPTION => return current,
            Some(choice) => current = current.join(&sanitize_segment(&choice)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dpsync_core::client::{DataPowerClientError, MockDataPowerClient};
    use pretty_assertions::assert_eq;
    use rstest::*;

    fn domain() -> DomainName {
        DomainName("default".to_string())
    }

    #[rstest]
    #[case("junk/realname/", "realname")]
    #[case("local:/sub", "sub")]
    #[case("realname/", "realname")]
    #[case("realname", "realname")]
    fn segment_sanitizing(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(expected, sanitize_segment(raw))
    }

    #[test]
    fn empty_listing_resolves_to_start_without_prompt() {
        let mut client = MockDataPowerClient::new();
        client
            .expect_list_directory()
            .times(1)
            .returning(|_, _| Ok(vec![]));
        // No select expectation : a prompt would panic
        let selector = MockFolderSelector::new();

        let resolved = resolve_folder(&client, &selector, &domain(), RemoteFolderPath::new("local"));

        assert_eq!("local", resolved.as_str())
    }

    #[test]
    fn walk_appends_sanitized_picks_until_exit() {
        let mut client = MockDataPowerClient::new();
        client
            .expect_list_directory()
            .returning(|_, folder| match folder.as_str() {
                "local" => Ok(vec![
                    "local:/sub/".to_string(),
                    "local:/other/".to_string(),
                ]),
                "local/sub" => Ok(vec!["local:/deeper/".to_string()]),
                _ => Ok(vec![]),
            });
        let mut selector = MockFolderSelector::new();
        selector.expect_select().returning(|_, options| {
            if options.contains(&"local:/sub/".to_string()) {
                Some("local:/sub/".to_string())
            } else {
                Some(EXIT_OPTION.to_string())
            }
        });

        let resolved = resolve_folder(&client, &selector, &domain(), RemoteFolderPath::new("local"));

        assert_eq!("local/sub", resolved.as_str())
    }

    #[test]
    fn resolved_path_extends_start_path() {
        let mut client = MockDataPowerClient::new();
        client
            .expect_list_directory()
            .returning(|_, _| Ok(vec!["a".to_string()]));
        let mut selector = MockFolderSelector::new();
        let mut remaining_picks = 3;
        selector.expect_select().returning(move |_, _| {
            if remaining_picks == 0 {
                return Some(EXIT_OPTION.to_string());
            }
            remaining_picks -= 1;
            Some("a".to_string())
        });

        let resolved = resolve_folder(&client, &selector, &domain(), RemoteFolderPath::new("local"));

        assert_eq!("local/a/a/a", resolved.as_str());
        assert!(resolved.as_str().starts_with("local/"))
    }

    #[test]
    fn cancelled_selection_resolves_to_current() {
        let mut client = MockDataPowerClient::new();
        client
            .expect_list_directory()
            .times(1)
            .returning(|_, _| Ok(vec!["sub".to_string()]));
        let mut selector = MockFolderSelector::new();
        selector.expect_select().times(1).returning(|_, _| None);

        let resolved = resolve_folder(&client, &selector, &domain(), RemoteFolderPath::new("local"));

        assert_eq!("local", resolved.as_str())
    }

    #[test]
    fn listing_error_steps_back_to_parent() {
        let mut client = MockDataPowerClient::new();
        client
            .expect_list_directory()
            .returning(|_, folder| match folder.as_str() {
                "local" => Ok(vec!["sub".to_string()]),
                _ => Err(DataPowerClientError::Connection),
            });
        let mut selector = MockFolderSelector::new();
        selector
            .expect_select()
            .times(1)
            .returning(|_, _| Some("sub".to_string()));

        let resolved = resolve_folder(&client, &selector, &domain(), RemoteFolderPath::new("local"));

        assert_eq!("local", resolved.as_str())
    }

    #[test]
    fn location_pick_strips_trailing_colon() {
        let mut client = MockDataPowerClient::new();
        client
            .expect_locations()
            .times(1)
            .returning(|_| Ok(vec!["local:".to_string(), "store:".to_string()]));
        let mut selector = MockFolderSelector::new();
        selector
            .expect_select()
            .times(1)
            .returning(|_, _| Some("local:".to_string()));

        let start = choose_location(&client, &selector, &domain()).unwrap();

        assert_eq!("local", start.as_str())
    }

    #[test]
    fn cancelled_location_pick_is_a_startup_error() {
        let mut client = MockDataPowerClient::new();
        client
            .expect_locations()
            .times(1)
            .returning(|_| Ok(vec!["local:".to_string()]));
        let mut selector = MockFolderSelector::new();
        selector.expect_select().times(1).returning(|_, _| None);

        assert!(matches!(
            choose_location(&client, &selector, &domain()),
            Err(Error::StartupError(_))
        ))
    }

    #[test]
    fn domain_pick_returns_selected_name() {
        let mut client = MockDataPowerClient::new();
        client.expect_domains().times(1).returning(|| {
            Ok(vec![
                DomainName("default".to_string()),
                DomainName("staging".to_string()),
            ])
        });
        let mut selector = MockFolderSelector::new();
        selector
            .expect_select()
            .times(1)
            .returning(|_, _| Some("staging".to_string()));

        let selected = choose_domain(&client, &selector).unwrap();

        assert_eq!(DomainName("staging".to_string()), selected)
    }
}
