// SPDX-License-Identifier: MIT

use super::*;

#[tokio::test]
async fn help_flag_prints_usage_and_exits_zero() {
    assert_eq!(run(vec!["--help".to_owned()]).await, 0);
    assert_eq!(run(vec!["-h".to_owned()]).await, 0);
    assert_eq!(run(vec!["help".to_owned()]).await, 0);
}

#[tokio::test]
async fn missing_command_is_a_usage_error() {
    // No command given and no valid idle prefix: Args parses with an empty
    // `command`, which `validate()` rejects (§7 usage errors, exit 2).
    assert_eq!(run(vec![]).await, 2);
}

#[tokio::test]
async fn flag_missing_its_required_value_is_a_usage_error() {
    // `--heartbeat-interval` expects a value; clap rejects this before the
    // trailing `command` positional ever gets a chance to swallow it, so
    // this never reaches the supervisor (which would need a real tty).
    assert_eq!(run(vec!["--heartbeat-interval".to_owned()]).await, 2);
}

#[test]
fn default_filter_is_info_unless_debug_flag_is_exactly_one() {
    assert_eq!(default_filter(None), "info");
    assert_eq!(default_filter(Some("0")), "info");
    assert_eq!(default_filter(Some("true")), "info");
    assert_eq!(default_filter(Some("1")), "info,do_ai=debug");
}
