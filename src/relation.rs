//! The relation to the OpenStack integrator and the data it publishes

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use ex::fs::read;
use log::debug;
use nom::bytes::complete::tag;
use nom::character::complete::digit1;
use nom::combinator::{map_res, verify};
use nom::sequence::separated_pair;
use nom::{Err as NomErr, IResult, Needed};
use serde_derive::{Deserialize, Serialize};
use serde_json::{from_str as from_json, Value as JsonValue};
use serde_yaml::{from_slice, Value};

use crate::error::IntegrationError;

/// Matches a `kebab-case` name that must not start or end with a dash
fn kebab_case(input: &str) -> IResult<&str, &str> {
    if input.is_empty() {
        return Err(NomErr::Incomplete(Needed::Size(1)));
    }

    // A dash is only valid between two alphanumeric characters, and must be followed by a letter
    let index = input
        .char_indices()
        .find(|&(i, ch)| {
            let alpha_next = input[i + ch.len_utf8()..]
                .chars()
                .next()
                .map(|ch| ch.is_ascii_alphabetic())
                .unwrap_or(false);

            let valid_char = ch.is_ascii_alphanumeric();
            let valid_dash = ch == '-' && i != 0 && alpha_next;

            !(valid_char || valid_dash)
        })
        .map(|(i, _)| i);

    match index {
        Some(i) => {
            let split = input.split_at(i);
            Ok((split.1, split.0))
        }
        None => Ok(("", input)),
    }
}

/// Parses an endpoint or application name
fn parse_name(input: &str) -> IResult<&str, &str> {
    verify(kebab_case, |name: &str| !name.is_empty())(input)
}

fn parse_number(input: &str) -> IResult<&str, u32> {
    map_res(digit1, |n: &str| n.parse::<u32>())(input)
}

/// Parses a relation id such as `openstack:7`
fn parse_relation_id(input: &str) -> IResult<&str, RelationId> {
    let (remainder, (endpoint, number)) =
        separated_pair(parse_name, tag(":"), parse_number)(input)?;

    Ok((
        remainder,
        RelationId {
            endpoint: endpoint.to_string(),
            number,
        },
    ))
}

/// Parses a unit name such as `openstack-integrator/0`
fn parse_unit_name(input: &str) -> IResult<&str, UnitName> {
    let (remainder, (application, number)) =
        separated_pair(parse_name, tag("/"), parse_number)(input)?;

    Ok((
        remainder,
        UnitName {
            application: application.to_string(),
            number,
        },
    ))
}

/// Run a parser over the whole of `input`, complaining about anything left over
fn parse_all<'a, T>(
    parser: fn(&'a str) -> IResult<&'a str, T>,
    input: &'a str,
) -> Result<T, String> {
    let (remainder, parsed) = parser(input).map_err(|err| format!("{:?}", err))?;

    if !remainder.is_empty() {
        return Err(format!("got extra data at end: `{}`", remainder));
    }

    Ok(parsed)
}

/// Identifies one relation of an endpoint, e.g. `openstack:7`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RelationId {
    pub endpoint: String,
    pub number: u32,
}

impl RelationId {
    pub fn new<S: Into<String>>(endpoint: S, number: u32) -> Self {
        Self {
            endpoint: endpoint.into(),
            number,
        }
    }

    pub fn parse(input: &str) -> Result<Self, IntegrationError> {
        parse_all(parse_relation_id, input)
            .map_err(|err| IntegrationError::RelationIdError(input.to_string(), err))
    }
}

/// A unit of the remote application, e.g. `openstack-integrator/0`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitName {
    pub application: String,
    pub number: u32,
}

impl UnitName {
    pub fn new<S: Into<String>>(application: S, number: u32) -> Self {
        Self {
            application: application.into(),
            number,
        }
    }

    pub fn parse(input: &str) -> Result<Self, IntegrationError> {
        parse_all(parse_unit_name, input)
            .map_err(|err| IntegrationError::UnitNameError(input.to_string(), err))
    }
}

macro_rules! string_serde {
    ($name:ident) => {
        impl FromStr for $name {
            type Err = IntegrationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<$name, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                use serde::de::Error;
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(|err| Error::custom(format!("{}", err)))
            }
        }
    };
}

string_serde!(RelationId);
string_serde!(UnitName);

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.endpoint, self.number)
    }
}

impl fmt::Display for UnitName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.application, self.number)
    }
}

/// Data received from the remote side of a relation, keyed by field name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSet(BTreeMap<String, Value>);

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a field set from raw relation data, as returned by `relation-get`
    ///
    /// The provider JSON-encodes every value. Quoted strings, booleans and `null` are decoded;
    /// anything else is kept as the raw text.
    pub fn from_raw<I, K, V>(raw: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<str>,
    {
        let mut fields = Self::new();
        for (key, value) in raw {
            let value = value.as_ref();
            let decoded = match from_json::<JsonValue>(value) {
                Ok(JsonValue::String(s)) => Value::String(s),
                Ok(JsonValue::Bool(b)) => Value::Bool(b),
                Ok(JsonValue::Null) => Value::Null,
                _ => Value::String(value.to_string()),
            };
            fields.set(key, decoded);
        }
        fields
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, IntegrationError> {
        Self::load_from_bytes(&read(path.as_ref())?)
    }

    /// Parse a YAML mapping of field name to value
    pub fn load_from_bytes(bytes: &[u8]) -> Result<Self, IntegrationError> {
        Ok(from_slice(bytes)?)
    }

    /// Store a value, replacing whatever was previously received for `key`
    pub fn set<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) {
        self.0.insert(key.into(), value.into());
    }

    /// Apply every field of `other` in turn, last value wins
    pub fn merge(&mut self, other: FieldSet) {
        for (key, value) in other.0 {
            debug!("Received relation field `{}`", key);
            self.0.insert(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// The value of `key` if it was received as a string
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.0.get(key) {
            Some(Value::String(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// The value of `key` if it was received as a boolean, or as a string spelling one
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.0.get(key) {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Some(true),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The relation to the provider application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeerConnection {
    pub id: RelationId,

    /// Remote units that have joined, in the order they joined
    #[serde(default)]
    pub units: Vec<UnitName>,

    /// Everything the remote units have published so far
    #[serde(default)]
    pub received: FieldSet,
}

impl PeerConnection {
    pub fn new(id: RelationId) -> Self {
        Self {
            id,
            units: vec![],
            received: FieldSet::new(),
        }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, IntegrationError> {
        Self::load_from_bytes(&read(path.as_ref())?)
    }

    pub fn load_from_bytes(bytes: &[u8]) -> Result<Self, IntegrationError> {
        Ok(from_slice(bytes)?)
    }

    pub fn with_received(self, received: FieldSet) -> Self {
        Self { received, ..self }
    }

    pub fn join_unit(&mut self, unit: UnitName) {
        if !self.units.contains(&unit) {
            self.units.push(unit);
        }
    }

    pub fn depart_unit(&mut self, unit: &UnitName) {
        self.units.retain(|u| u != unit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kebab_case() {
        let (remainder, parsed) = kebab_case("openstack-integrator/0").unwrap();

        assert_eq!(parsed, "openstack-integrator");
        assert_eq!(remainder, "/0");

        let (remainder, parsed) = kebab_case("-foo").unwrap();
        assert_eq!(parsed, "");
        assert_eq!(remainder, "-foo");
    }

    #[test]
    fn test_relation_id() {
        let id = RelationId::parse("openstack:7").unwrap();

        assert_eq!(id, RelationId::new("openstack", 7));
        assert_eq!(id.to_string(), "openstack:7");
    }

    #[test]
    fn test_relation_id_invalid() {
        assert!(RelationId::parse("openstack").is_err());
        assert!(RelationId::parse(":7").is_err());
        assert!(RelationId::parse("openstack:7x").is_err());
        assert!(RelationId::parse("").is_err());
    }

    #[test]
    fn test_unit_name() {
        let unit: UnitName = "openstack-integrator/0".parse().unwrap();

        assert_eq!(unit, UnitName::new("openstack-integrator", 0));
        assert_eq!(unit.to_string(), "openstack-integrator/0");
        assert!(UnitName::parse("openstack-integrator/").is_err());
    }

    #[test]
    fn test_from_raw_decodes_json() {
        let fields = FieldSet::from_raw(vec![
            ("auth_url", "\"https://keystone:5000/v3\""),
            ("manage_security_groups", "true"),
            ("node_security_group", "null"),
            ("subnet_id", "1234"),
            ("region", "RegionOne"),
        ]);

        assert_eq!(fields.get_str("auth_url"), Some("https://keystone:5000/v3"));
        assert_eq!(fields.get_bool("manage_security_groups"), Some(true));
        assert_eq!(fields.get("node_security_group"), Some(&Value::Null));
        assert_eq!(fields.get_str("subnet_id"), Some("1234"));
        assert_eq!(fields.get_str("region"), Some("RegionOne"));
    }

    #[test]
    fn test_from_raw_keeps_non_json_verbatim() {
        let raw = vec![
            ("lb_method", "line1\nline2"),
            ("node_security_group", "sg-1 # x"),
            ("region", "'quoted'"),
            ("subnet_id", "~"),
        ];
        let fields = FieldSet::from_raw(raw.clone());

        for (key, value) in raw {
            assert_eq!(fields.get_str(key), Some(value), "{} was altered", key);
        }
    }

    #[test]
    fn test_last_value_wins() {
        let mut fields = FieldSet::new();
        fields.set("username", "admin");

        let mut update = FieldSet::new();
        update.set("username", "demo");
        update.set("password", "secret");
        fields.merge(update);

        assert_eq!(fields.get_str("username"), Some("demo"));
        assert_eq!(fields.get_str("password"), Some("secret"));
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_wrong_types_read_as_absent() {
        let mut fields = FieldSet::new();
        fields.set("username", 42i64);
        fields.set("manage_security_groups", "yes please");

        assert_eq!(fields.get_str("username"), None);
        assert_eq!(fields.get_bool("manage_security_groups"), None);
    }

    #[test]
    fn test_units() {
        let mut conn = PeerConnection::new(RelationId::new("openstack", 1));
        conn.join_unit(UnitName::new("openstack-integrator", 0));
        conn.join_unit(UnitName::new("openstack-integrator", 0));
        conn.join_unit(UnitName::new("openstack-integrator", 1));

        assert_eq!(conn.units.len(), 2);

        conn.depart_unit(&UnitName::new("openstack-integrator", 0));
        assert_eq!(conn.units, vec![UnitName::new("openstack-integrator", 1)]);
    }
}
