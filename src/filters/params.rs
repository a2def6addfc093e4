//! Query-string parsing into storage query arguments
//!
//! Parsing never fails. An unparsable `limit`, `offset`, time bound or typed
//! filter value is logged and ignored, so the request behaves as if the parameter
//! had been omitted.

use crate::filters::bridge::{parse_inet, parse_int, parse_mac, parse_millis};
use crate::filters::spec::{
    ColumnPredicate, FilterField, FilterKind, FilterSpec, Predicate, MAX_LIMIT, SENTINEL_EMPTY,
    SENTINEL_NULL,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Page bounds for a listing query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageSpec {
    pub limit: u32,
    pub offset: u64,
}

impl PageSpec {
    /// Read `limit` and `offset`, falling back to defaults for anything out of range.
    pub fn from_params(params: &HashMap<String, String>, default_limit: u32) -> Self {
        let mut page = PageSpec {
            limit: default_limit,
            offset: 0,
        };

        if let Some(raw) = params.get("limit") {
            match raw.trim().parse::<i64>() {
                Ok(l) if (1..=MAX_LIMIT as i64).contains(&l) => page.limit = l as u32,
                Ok(l) => debug!(
                    "limit {} outside 1..={}, using default {}",
                    l, MAX_LIMIT, default_limit
                ),
                Err(e) => debug!("ignoring malformed limit '{}': {}", raw, e),
            }
        }

        if let Some(raw) = params.get("offset") {
            match raw.trim().parse::<i64>() {
                Ok(o) if o > 0 => page.offset = o as u64,
                Ok(o) => debug!("offset {} not positive, using 0", o),
                Err(e) => debug!("ignoring malformed offset '{}': {}", raw, e),
            }
        }

        page
    }
}

/// Creation and modification time bounds, inclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeRange {
    pub updated_ge: Option<DateTime<Utc>>,
    pub updated_le: Option<DateTime<Utc>>,
    pub created_ge: Option<DateTime<Utc>>,
    pub created_le: Option<DateTime<Utc>>,
}

impl TimeRange {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let bound = |key: &str| params.get(key).and_then(|v| parse_millis(v));
        TimeRange {
            updated_ge: bound("updated_ge"),
            updated_le: bound("updated_le"),
            created_ge: bound("created_ge"),
            created_le: bound("created_le"),
        }
    }
}

/// Everything a listing or count query needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListArgs {
    pub page: PageSpec,
    pub time: TimeRange,
    pub predicates: Vec<ColumnPredicate>,
}

impl ListArgs {
    /// Build query arguments for an endpoint from its query parameters.
    pub fn from_params(params: &HashMap<String, String>, spec: &FilterSpec) -> Self {
        let mut predicates = Vec::new();
        for field in spec.fields {
            predicates.extend(field_predicates(field, params));
        }

        ListArgs {
            page: PageSpec::from_params(params, spec.default_limit),
            time: TimeRange::from_params(params),
            predicates,
        }
    }

    /// Arguments that match everything, one default page.
    pub fn unfiltered(default_limit: u32) -> Self {
        ListArgs {
            page: PageSpec {
                limit: default_limit,
                offset: 0,
            },
            time: TimeRange::default(),
            predicates: Vec::new(),
        }
    }

    /// Same constraints without page bounds, for count queries.
    pub fn count_args(&self) -> ListArgs {
        ListArgs {
            page: PageSpec {
                limit: MAX_LIMIT,
                offset: 0,
            },
            time: self.time,
            predicates: self.predicates.clone(),
        }
    }
}

fn field_predicates(field: &FilterField, params: &HashMap<String, String>) -> Vec<ColumnPredicate> {
    let column = field.column;
    let wrap = |predicate| ColumnPredicate { column, predicate };

    if field.kind == FilterKind::IntRange {
        let mut out = Vec::new();
        if let Some(v) = params.get(&format!("{}_ge", field.key)).and_then(|v| parse_int(v)) {
            out.push(wrap(Predicate::IntAtLeast(v)));
        }
        if let Some(v) = params.get(&format!("{}_le", field.key)).and_then(|v| parse_int(v)) {
            out.push(wrap(Predicate::IntAtMost(v)));
        }
        return out;
    }

    let value = match params.get(field.key) {
        Some(v) if !v.is_empty() => v,
        _ => return Vec::new(),
    };

    if field.sentinels {
        if value == SENTINEL_NULL {
            return vec![wrap(Predicate::IsNull)];
        }
        if value == SENTINEL_EMPTY {
            return vec![wrap(Predicate::IsEmpty)];
        }
    }

    let predicate = match field.kind {
        FilterKind::Exact => Some(Predicate::Equals(value.clone())),
        FilterKind::Pattern => Some(Predicate::Like(value.clone())),
        FilterKind::IPattern => Some(Predicate::ILike(value.clone())),
        FilterKind::Int => parse_int(value).map(Predicate::IntEquals),
        FilterKind::Network => parse_inet(value).map(Predicate::WithinNetwork),
        FilterKind::Mac => parse_mac(value).map(Predicate::MacEquals),
        FilterKind::IntRange => None,
    };

    if predicate.is_none() {
        debug!("filter {}='{}' not applied", field.key, value);
    }
    predicate.map(wrap).into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::spec::{FilterField, DEFAULT_LIMIT, LARGE_DEFAULT_LIMIT};
    use std::str::FromStr;

    const FIELDS: &[FilterField] = &[
        FilterField::new("name_f", "name", FilterKind::IPattern),
        FilterField::new("descr_f", "descr", FilterKind::Pattern).with_sentinels(),
        FilterField::new("host_ip4_f", "host_ip4", FilterKind::Network).with_sentinels(),
        FilterField::new("mac_f", "mac", FilterKind::Mac),
        FilterField::new("site_id_f", "site_id", FilterKind::Int),
        FilterField::new("ifindex", "ifindex", FilterKind::IntRange),
        FilterField::new("version_f", "version", FilterKind::Exact),
    ];

    const SPEC: FilterSpec = FilterSpec {
        fields: FIELDS,
        default_limit: DEFAULT_LIMIT,
    };

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_limit_accepted() {
        let page = PageSpec::from_params(&params(&[("limit", "50")]), DEFAULT_LIMIT);
        assert_eq!(page.limit, 50);
        let page = PageSpec::from_params(&params(&[("limit", "1000")]), DEFAULT_LIMIT);
        assert_eq!(page.limit, 1000);
        let page = PageSpec::from_params(&params(&[("limit", "1")]), DEFAULT_LIMIT);
        assert_eq!(page.limit, 1);
    }

    #[test]
    fn test_limit_defaults() {
        let page = PageSpec::from_params(&params(&[]), DEFAULT_LIMIT);
        assert_eq!(page.limit, DEFAULT_LIMIT);
        let page = PageSpec::from_params(&params(&[]), LARGE_DEFAULT_LIMIT);
        assert_eq!(page.limit, LARGE_DEFAULT_LIMIT);

        for bad in ["-5", "0", "1001", "abc", "", "2.5"] {
            let page = PageSpec::from_params(&params(&[("limit", bad)]), DEFAULT_LIMIT);
            assert_eq!(page.limit, DEFAULT_LIMIT, "limit={}", bad);
        }
    }

    #[test]
    fn test_offset() {
        let page = PageSpec::from_params(&params(&[("offset", "10")]), DEFAULT_LIMIT);
        assert_eq!(page.offset, 10);
        let page = PageSpec::from_params(&params(&[("offset", "-1")]), DEFAULT_LIMIT);
        assert_eq!(page.offset, 0);
        let page = PageSpec::from_params(&params(&[("offset", "x")]), DEFAULT_LIMIT);
        assert_eq!(page.offset, 0);
    }

    #[test]
    fn test_time_range() {
        let range = TimeRange::from_params(&params(&[
            ("updated_ge", "1700000000000"),
            ("created_le", "not-a-time"),
        ]));
        assert_eq!(
            range.updated_ge.map(|t| t.timestamp_millis()),
            Some(1_700_000_000_000)
        );
        assert_eq!(range.updated_le, None);
        assert_eq!(range.created_ge, None);
        assert_eq!(range.created_le, None);

        let range = TimeRange::from_params(&params(&[("updated_ge", "garbage")]));
        assert_eq!(range, TimeRange::default());
        assert_eq!(range, TimeRange::from_params(&params(&[])));
    }

    #[test]
    fn test_absent_filters_do_not_constrain() {
        let args = ListArgs::from_params(&params(&[]), &SPEC);
        assert!(args.predicates.is_empty());
        assert_eq!(args, ListArgs::unfiltered(DEFAULT_LIMIT));

        let args = ListArgs::from_params(&params(&[("descr_f", ""), ("unknown_f", "x")]), &SPEC);
        assert!(args.predicates.is_empty());
    }

    #[test]
    fn test_pattern_filters() {
        let args = ListArgs::from_params(
            &params(&[("name_f", "%core%"), ("descr_f", "Uplink%")]),
            &SPEC,
        );
        assert_eq!(
            args.predicates,
            vec![
                ColumnPredicate {
                    column: "name",
                    predicate: Predicate::ILike("%core%".to_string())
                },
                ColumnPredicate {
                    column: "descr",
                    predicate: Predicate::Like("Uplink%".to_string())
                },
            ]
        );
    }

    #[test]
    fn test_sentinels() {
        let args = ListArgs::from_params(&params(&[("descr_f", "isnull")]), &SPEC);
        assert_eq!(args.predicates[0].predicate, Predicate::IsNull);

        let args = ListArgs::from_params(&params(&[("descr_f", "isempty")]), &SPEC);
        assert_eq!(args.predicates[0].predicate, Predicate::IsEmpty);

        let args = ListArgs::from_params(&params(&[("host_ip4_f", "isnull")]), &SPEC);
        assert_eq!(args.predicates[0].predicate, Predicate::IsNull);

        // fields without sentinel support treat the literal as an ordinary operand
        let args = ListArgs::from_params(&params(&[("name_f", "isnull")]), &SPEC);
        assert_eq!(
            args.predicates[0].predicate,
            Predicate::ILike("isnull".to_string())
        );

        // sentinels are matched exactly
        let args = ListArgs::from_params(&params(&[("descr_f", "ISNULL")]), &SPEC);
        assert_eq!(
            args.predicates[0].predicate,
            Predicate::Like("ISNULL".to_string())
        );
    }

    #[test]
    fn test_typed_filters() {
        let args = ListArgs::from_params(
            &params(&[
                ("host_ip4_f", "10.0.0.1"),
                ("mac_f", "00-00-5e-00-53-01"),
                ("site_id_f", "7"),
                ("version_f", "2c"),
            ]),
            &SPEC,
        );
        assert_eq!(
            args.predicates
                .iter()
                .map(|p| p.predicate.clone())
                .collect::<Vec<_>>(),
            vec![
                Predicate::WithinNetwork(ipnet::IpNet::from_str("10.0.0.1/32").unwrap()),
                Predicate::MacEquals(crate::filters::bridge::parse_mac("00:00:5e:00:53:01").unwrap()),
                Predicate::IntEquals(7),
                Predicate::Equals("2c".to_string()),
            ]
        );
    }

    #[test]
    fn test_malformed_typed_filters_are_dropped() {
        let args = ListArgs::from_params(
            &params(&[
                ("host_ip4_f", "not-an-ip"),
                ("mac_f", "zz:zz"),
                ("site_id_f", "seven"),
                ("ifindex_ge", "x"),
            ]),
            &SPEC,
        );
        assert!(args.predicates.is_empty());
    }

    #[test]
    fn test_int_range() {
        let args = ListArgs::from_params(
            &params(&[("ifindex_ge", "3"), ("ifindex_le", "10"), ("ifindex", "5")]),
            &SPEC,
        );
        assert_eq!(
            args.predicates,
            vec![
                ColumnPredicate {
                    column: "ifindex",
                    predicate: Predicate::IntAtLeast(3)
                },
                ColumnPredicate {
                    column: "ifindex",
                    predicate: Predicate::IntAtMost(10)
                },
            ]
        );
    }
}
