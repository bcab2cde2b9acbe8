#[cfg(test)]
mod tests {
    use crate::error::ConfigError;
    use crate::time::timezone::{
        parse_record_timestamp, parse_utc_offset, ReportingWindow, TimezoneHistory,
        TimezoneMode, TimezoneRule,
    };
    use chrono::{Duration, FixedOffset, NaiveDate, TimeZone, Timelike};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn offset(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    /// Pacific until 2023-05-24, then British summer time until 2023-12-30.
    fn two_zone_history() -> TimezoneHistory {
        TimezoneHistory::new(vec![
            TimezoneRule::new("PDT", date(2020, 1, 1), date(2023, 5, 24), offset(-8)),
            TimezoneRule::new("BST", date(2023, 5, 24), date(2023, 12, 30), offset(1)),
        ])
    }

    #[test]
    fn test_parse_record_timestamp() {
        let ts = parse_record_timestamp("2023-06-01 08:15:00 -0700").unwrap();
        assert_eq!(ts.offset().local_minus_utc(), -7 * 3600);
        assert_eq!(ts.hour(), 8);
        assert!(parse_record_timestamp("2023-06-01T08:15:00Z").is_none());
        assert!(parse_record_timestamp("").is_none());
    }

    #[test]
    fn test_parse_utc_offset_variants() {
        assert_eq!(parse_utc_offset("+01:00").unwrap(), offset(1));
        assert_eq!(parse_utc_offset("-08:00").unwrap(), offset(-8));
        assert_eq!(
            parse_utc_offset("+0530").unwrap().local_minus_utc(),
            5 * 3600 + 30 * 60
        );
        assert!(matches!(
            parse_utc_offset("+25:00"),
            Err(ConfigError::InvalidUtcOffset(_))
        ));
        assert!(parse_utc_offset("UTC").is_err());
    }

    #[test]
    fn test_validate_accepts_contiguous_and_gapped_rules() {
        assert!(two_zone_history().validate().is_ok());

        let gapped = TimezoneHistory::new(vec![
            TimezoneRule::new("A", date(2020, 1, 1), date(2020, 2, 1), offset(0)),
            TimezoneRule::new("B", date(2020, 3, 1), date(2020, 4, 1), offset(2)),
        ]);
        assert!(gapped.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_tables() {
        assert!(matches!(
            TimezoneHistory::new(Vec::new()).validate(),
            Err(ConfigError::EmptyTimezoneHistory)
        ));

        let inverted = TimezoneHistory::new(vec![TimezoneRule::new(
            "A",
            date(2020, 2, 1),
            date(2020, 2, 1),
            offset(0),
        )]);
        assert!(matches!(
            inverted.validate(),
            Err(ConfigError::InvertedTimezoneRule { index: 0, .. })
        ));

        let overlapping = TimezoneHistory::new(vec![
            TimezoneRule::new("A", date(2020, 1, 1), date(2020, 3, 1), offset(0)),
            TimezoneRule::new("B", date(2020, 2, 1), date(2020, 4, 1), offset(2)),
        ]);
        assert!(matches!(
            overlapping.validate(),
            Err(ConfigError::OverlappingTimezoneRules { index: 1, .. })
        ));
    }

    #[test]
    fn test_resolve_uses_rule_offset() {
        let history = two_zone_history();
        // Exported from India, taken in California
        let ts = parse_record_timestamp("2022-07-10 06:30:00 +0530").unwrap();
        let local = history.resolve(&ts).unwrap();
        assert_eq!(local.date(), date(2022, 7, 9));
        assert_eq!(local.hour(), 17);
    }

    #[test]
    fn test_resolve_second_rule() {
        let history = two_zone_history();
        let ts = parse_record_timestamp("2023-08-01 23:30:00 +0000").unwrap();
        let local = history.resolve(&ts).unwrap();
        assert_eq!(local.date(), date(2023, 8, 2));
        assert_eq!(local.hour(), 0);
    }

    #[test]
    fn test_resolve_boundary_date_goes_to_earlier_rule() {
        let history = two_zone_history();
        // 2023-05-24 12:00 PDT, still on the boundary date under the first rule
        let ts = parse_record_timestamp("2023-05-24 20:00:00 +0000").unwrap();
        let local = history.resolve(&ts).unwrap();
        assert_eq!(local.date(), date(2023, 5, 24));
        assert_eq!(local.hour(), 12);

        // Past midnight Pacific on the 25th: the second rule takes over
        let ts = parse_record_timestamp("2023-05-25 09:00:00 +0000").unwrap();
        let local = history.resolve(&ts).unwrap();
        assert_eq!(local.date(), date(2023, 5, 25));
        assert_eq!(local.hour(), 10);
    }

    #[test]
    fn test_resolve_first_day_in_bounds() {
        let history = two_zone_history();
        let ts = parse_record_timestamp("2020-01-01 00:00:00 -0800").unwrap();
        assert_eq!(history.resolve(&ts).unwrap().date(), date(2020, 1, 1));
    }

    #[test]
    fn test_resolve_before_history_fails() {
        let history = two_zone_history();
        let ts = parse_record_timestamp("2019-12-31 23:00:00 -0800").unwrap();
        assert!(history.resolve(&ts).is_none());
    }

    #[test]
    fn test_resolve_after_history_fails() {
        let history = two_zone_history();
        let ts = parse_record_timestamp("2024-02-01 12:00:00 +0000").unwrap();
        assert!(history.resolve(&ts).is_none());
    }

    #[test]
    fn test_resolve_gap_fails() {
        let history = TimezoneHistory::new(vec![
            TimezoneRule::new("A", date(2020, 1, 1), date(2020, 2, 1), offset(0)),
            TimezoneRule::new("B", date(2020, 3, 1), date(2020, 4, 1), offset(0)),
        ]);
        let ts = parse_record_timestamp("2020-02-15 12:00:00 +0000").unwrap();
        assert!(history.resolve(&ts).is_none());
        let ts = parse_record_timestamp("2020-03-15 12:00:00 +0000").unwrap();
        assert!(history.resolve(&ts).is_some());
    }

    #[test]
    fn test_export_timezone_mode_keeps_embedded_offset() {
        let history = TimezoneHistory::default();
        let ts = parse_record_timestamp("2018-04-03 22:10:00 +0800").unwrap();
        let local = history.localize(&ts, TimezoneMode::ExportTimezone).unwrap();
        assert_eq!(local.date(), date(2018, 4, 3));
        assert_eq!(local.hour(), 22);
        assert!(history.localize(&ts, TimezoneMode::DataTimezone).is_none());
    }

    #[test]
    fn test_reporting_window() {
        let window = ReportingWindow::new(date(2024, 1, 1), date(2024, 2, 1)).unwrap();
        assert!(window.contains(date(2024, 1, 1)));
        assert!(window.contains(date(2024, 1, 31)));
        assert!(!window.contains(date(2024, 2, 1)));
        assert_eq!(window.num_days(), 31);

        assert!(matches!(
            ReportingWindow::new(date(2024, 2, 1), date(2024, 2, 1)),
            Err(ConfigError::InvalidWindow { .. })
        ));
    }

    proptest! {
        /// An instant strictly inside a rule's window, expressed in that
        /// rule's own offset, resolves to exactly that local date.
        #[test]
        fn prop_resolve_inside_window(rule_index in 0usize..3, day in 2i64..27, minute in 0u32..1440) {
            let rules = vec![
                TimezoneRule::new("A", date(2021, 1, 1), date(2021, 1, 29), offset(-8)),
                TimezoneRule::new("B", date(2021, 1, 29), date(2021, 2, 26), offset(5)),
                TimezoneRule::new("C", date(2021, 2, 26), date(2021, 3, 26), offset(9)),
            ];
            let history = TimezoneHistory::new(rules.clone());
            let rule = &rules[rule_index];
            let local_date = rule.start + Duration::days(day);
            let local = local_date.and_hms_opt(minute / 60, minute % 60, 0).unwrap();
            let instant = rule.offset.from_local_datetime(&local).unwrap();

            prop_assert_eq!(history.resolve(&instant), Some(local));
        }

        #[test]
        fn prop_resolve_before_history_fails(days_before in 1i64..2000, hour in 0u32..24) {
            let history = two_zone_history();
            let local = (date(2020, 1, 1) - Duration::days(days_before))
                .and_hms_opt(hour, 0, 0)
                .unwrap();
            let instant = offset(-8).from_local_datetime(&local).unwrap();
            prop_assert!(history.resolve(&instant).is_none());
        }
    }
}
