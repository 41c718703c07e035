use sf_app::{DiagnosticLog, LogLevel};

#[test]
fn test_keeps_only_the_most_recent_records() {
    let log = DiagnosticLog::new(100);

    for i in 0..150 {
        let level = if i % 2 == 0 { LogLevel::Info } else { LogLevel::Warn };
        log.log(level, format!("event {i}"), None, Some("feed"));
    }

    let records = log.records();
    assert_eq!(records.len(), 100);
    let expected: Vec<String> = (50..150).map(|i| format!("event {i}")).collect();
    let actual: Vec<String> = records.into_iter().map(|r| r.message).collect();
    assert_eq!(actual, expected);
}

#[test]
fn test_records_serialize_for_diagnostics_dumps() {
    let log = DiagnosticLog::new(2);
    log.error("profile fetch failed", Some(&"403 forbidden"), Some("guard"));

    let json = serde_json::to_value(log.records()).unwrap();

    assert_eq!(json[0]["level"], "error");
    assert_eq!(json[0]["error"], "403 forbidden");
    assert_eq!(json[0]["context"], "guard");
    assert!(json[0]["timestamp"].is_string());
}
