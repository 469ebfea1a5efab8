//! In-memory editing operations over an [`AppConfig`]
//!
//! The presentation layer collects raw field values into a [`RuleDraft`] and
//! commits the whole draft at once; nothing here touches the filesystem.

use crate::config::{AppConfig, Protocol, ProxyRule};
use crate::error::RuleIndexError;

/// Raw editor field values for one proxy rule, exactly as entered.
///
/// `app_names` holds the multi-line text of the name list; normalization
/// happens on commit.
#[derive(Debug, Clone, Default)]
pub struct RuleDraft {
    pub app_names: String,
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub tcp: bool,
    pub udp: bool,
}

impl RuleDraft {
    fn to_rule(&self) -> ProxyRule {
        let mut supported_protocols = Vec::new();
        if self.tcp {
            supported_protocols.push(Protocol::Tcp);
        }
        if self.udp {
            supported_protocols.push(Protocol::Udp);
        }
        ProxyRule {
            app_names: split_names(&self.app_names),
            endpoint: self.endpoint.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            supported_protocols,
        }
    }
}

/// Mutation operations over a caller-held [`AppConfig`].
///
/// A rule is addressed by its index; removing a rule shifts every later
/// index down by one, so callers must commit any pending draft before an
/// index-based operation or the in-progress edit is lost.
pub struct RuleEditor;

impl RuleEditor {
    /// Append a fresh rule and return its index.
    pub fn add_rule(config: &mut AppConfig) -> usize {
        config.proxies.push(ProxyRule::new());
        config.proxies.len() - 1
    }

    /// Remove the rule at `index`. The configuration is untouched on error.
    pub fn remove_rule(config: &mut AppConfig, index: usize) -> Result<(), RuleIndexError> {
        if index >= config.proxies.len() {
            return Err(RuleIndexError {
                index,
                len: config.proxies.len(),
            });
        }
        config.proxies.remove(index);
        Ok(())
    }

    /// Normalize `draft` and overwrite the rule at `index`.
    ///
    /// Returns false when `index` no longer addresses a rule; the draft is
    /// dropped, mirroring an editor with nothing selected.
    pub fn commit_rule_edit(config: &mut AppConfig, index: usize, draft: &RuleDraft) -> bool {
        match config.proxies.get_mut(index) {
            Some(rule) => {
                *rule = draft.to_rule();
                true
            }
            None => false,
        }
    }

    /// Replace the global exclude list from raw multi-line text.
    pub fn set_excludes(config: &mut AppConfig, raw_text: &str) {
        config.excludes = split_names(raw_text);
    }
}

/// One name per line: entries trimmed, empty lines dropped, order kept.
fn split_names(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    fn draft(app_names: &str, endpoint: &str) -> RuleDraft {
        RuleDraft {
            app_names: app_names.to_string(),
            endpoint: endpoint.to_string(),
            tcp: true,
            ..RuleDraft::default()
        }
    }

    fn config_with_rules(endpoints: &[&str]) -> AppConfig {
        let mut config = AppConfig::default();
        for endpoint in endpoints {
            let index = RuleEditor::add_rule(&mut config);
            RuleEditor::commit_rule_edit(&mut config, index, &draft("app", endpoint));
        }
        config
    }

    #[test]
    fn add_rule_returns_previous_len_and_defaults() {
        let mut config = AppConfig::default();
        assert_eq!(RuleEditor::add_rule(&mut config), 0);
        assert_eq!(RuleEditor::add_rule(&mut config), 1);
        assert_eq!(config.proxies[1], ProxyRule::new());
    }

    #[test]
    fn remove_rule_shifts_later_indices_down() {
        let mut config = config_with_rules(&["a:1", "b:2", "c:3"]);
        RuleEditor::remove_rule(&mut config, 0).unwrap();
        assert_eq!(config.proxies.len(), 2);
        assert_eq!(config.proxies[0].endpoint, "b:2");
        assert_eq!(config.proxies[1].endpoint, "c:3");
    }

    #[test]
    fn remove_rule_out_of_range_leaves_config_unchanged() {
        let mut config = config_with_rules(&["a:1", "b:2"]);
        let before = config.clone();
        let err = RuleEditor::remove_rule(&mut config, 5).unwrap_err();
        assert_eq!(err, RuleIndexError { index: 5, len: 2 });
        assert_eq!(config, before);
    }

    #[test]
    fn commit_normalizes_app_name_lines() {
        let mut config = config_with_rules(&["a:1"]);
        let committed =
            RuleEditor::commit_rule_edit(&mut config, 0, &draft(" firefox \n\nchrome ", "a:1"));
        assert!(committed);
        assert_eq!(config.proxies[0].app_names, vec!["firefox", "chrome"]);
    }

    #[test]
    fn commit_with_invalid_index_is_a_no_op() {
        let mut config = config_with_rules(&["a:1"]);
        let before = config.clone();
        let committed = RuleEditor::commit_rule_edit(&mut config, 3, &draft("x", "y:1"));
        assert!(!committed);
        assert_eq!(config, before);
    }

    #[test]
    fn commit_orders_protocols_tcp_before_udp() {
        let mut config = config_with_rules(&["a:1"]);
        let draft = RuleDraft {
            app_names: "app".into(),
            endpoint: "a:1".into(),
            tcp: true,
            udp: true,
            ..RuleDraft::default()
        };
        RuleEditor::commit_rule_edit(&mut config, 0, &draft);
        assert_eq!(
            config.proxies[0].supported_protocols,
            vec![Protocol::Tcp, Protocol::Udp]
        );
    }

    #[test]
    fn commit_with_no_protocol_flags_yields_empty_set() {
        let mut config = config_with_rules(&["a:1"]);
        let draft = RuleDraft {
            endpoint: "a:1".into(),
            ..RuleDraft::default()
        };
        RuleEditor::commit_rule_edit(&mut config, 0, &draft);
        assert!(config.proxies[0].supported_protocols.is_empty());
    }

    #[test]
    fn same_app_name_may_appear_in_multiple_rules() {
        let mut config = AppConfig::default();
        for endpoint in ["a:1", "b:2"] {
            let index = RuleEditor::add_rule(&mut config);
            RuleEditor::commit_rule_edit(&mut config, index, &draft("firefox", endpoint));
        }
        assert_eq!(config.proxies[0].app_names, config.proxies[1].app_names);
    }

    #[test]
    fn set_excludes_normalizes_lines() {
        let mut config = AppConfig {
            log_level: LogLevel::Info,
            ..AppConfig::default()
        };
        RuleEditor::set_excludes(&mut config, " svchost.exe \n\n explorer.exe ");
        assert_eq!(config.excludes, vec!["svchost.exe", "explorer.exe"]);
        // Only the exclude list is touched.
        assert_eq!(config.log_level, LogLevel::Info);
    }

    #[test]
    fn set_excludes_with_blank_text_clears_the_list() {
        let mut config = AppConfig::default();
        RuleEditor::set_excludes(&mut config, "svchost.exe");
        RuleEditor::set_excludes(&mut config, "  \n ");
        assert!(config.excludes.is_empty());
    }
}
