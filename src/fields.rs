//! Typed view over the fields published by the OpenStack integrator

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_derive::{Deserialize, Serialize};

use crate::error::IntegrationError;
use crate::relation::FieldSet;

/// A field the integrator may publish on the relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    AuthUrl,
    Region,
    Username,
    Password,
    UserDomainName,
    ProjectDomainName,
    ProjectName,
    EndpointTlsCa,
    SubnetId,
    FloatingNetworkId,
    LbMethod,
    ManageSecurityGroups,
    NodeSecurityGroup,
}

/// Fields that must all be present before the endpoint is ready
pub const REQUIRED_FIELDS: [Field; 6] = [
    Field::AuthUrl,
    Field::Username,
    Field::Password,
    Field::UserDomainName,
    Field::ProjectDomainName,
    Field::ProjectName,
];

pub const ALL_FIELDS: [Field; 13] = [
    Field::AuthUrl,
    Field::Region,
    Field::Username,
    Field::Password,
    Field::UserDomainName,
    Field::ProjectDomainName,
    Field::ProjectName,
    Field::EndpointTlsCa,
    Field::SubnetId,
    Field::FloatingNetworkId,
    Field::LbMethod,
    Field::ManageSecurityGroups,
    Field::NodeSecurityGroup,
];

impl Field {
    /// The key this field is published under
    pub fn name(self) -> &'static str {
        match self {
            Field::AuthUrl => "auth_url",
            Field::Region => "region",
            Field::Username => "username",
            Field::Password => "password",
            Field::UserDomainName => "user_domain_name",
            Field::ProjectDomainName => "project_domain_name",
            Field::ProjectName => "project_name",
            Field::EndpointTlsCa => "endpoint_tls_ca",
            Field::SubnetId => "subnet_id",
            Field::FloatingNetworkId => "floating_network_id",
            Field::LbMethod => "lb_method",
            Field::ManageSecurityGroups => "manage_security_groups",
            Field::NodeSecurityGroup => "node_security_group",
        }
    }

    pub fn is_required(self) -> bool {
        REQUIRED_FIELDS.contains(&self)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = IntegrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_FIELDS
            .iter()
            .copied()
            .find(|field| field.name() == s)
            .ok_or_else(|| IntegrationError::UnknownField(s.to_string()))
    }
}

/// Value of a single field, as returned by `get`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Flag(bool),
}

/// Snapshot of everything received from the integrator
///
/// Rebuilt whenever new relation data arrives. Values of the wrong type are treated as if they
/// were never sent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IntegrationData {
    /// The authentication endpoint URL
    pub auth_url: Option<String>,

    pub region: Option<String>,

    pub username: Option<String>,

    pub password: Option<String>,

    pub user_domain_name: Option<String>,

    pub project_domain_name: Option<String>,

    /// The project name, also known as the tenant ID
    pub project_name: Option<String>,

    /// Base64-encoded CA certificate for the authentication endpoint
    pub endpoint_tls_ca: Option<String>,

    /// Subnet to work in
    pub subnet_id: Option<String>,

    pub floating_network_id: Option<String>,

    /// Load-balancer method
    pub lb_method: Option<String>,

    /// Whether the load balancer should manage security group rules itself
    #[serde(default)]
    pub manage_security_groups: bool,

    /// ID of the security group to manage if `manage_security_groups` is set
    pub node_security_group: Option<String>,
}

impl IntegrationData {
    pub fn from_fields(fields: &FieldSet) -> Self {
        let text = |field: Field| fields.get_str(field.name()).map(String::from);

        Self {
            auth_url: text(Field::AuthUrl),
            region: text(Field::Region),
            username: text(Field::Username),
            password: text(Field::Password),
            user_domain_name: text(Field::UserDomainName),
            project_domain_name: text(Field::ProjectDomainName),
            project_name: text(Field::ProjectName),
            endpoint_tls_ca: text(Field::EndpointTlsCa).filter(|ca| !ca.is_empty()),
            subnet_id: text(Field::SubnetId),
            floating_network_id: text(Field::FloatingNetworkId),
            lb_method: text(Field::LbMethod),
            manage_security_groups: fields
                .get_bool(Field::ManageSecurityGroups.name())
                .unwrap_or(false),
            node_security_group: text(Field::NodeSecurityGroup),
        }
    }

    pub fn get(&self, field: Field) -> Option<FieldValue<'_>> {
        let text = match field {
            Field::AuthUrl => &self.auth_url,
            Field::Region => &self.region,
            Field::Username => &self.username,
            Field::Password => &self.password,
            Field::UserDomainName => &self.user_domain_name,
            Field::ProjectDomainName => &self.project_domain_name,
            Field::ProjectName => &self.project_name,
            Field::EndpointTlsCa => &self.endpoint_tls_ca,
            Field::SubnetId => &self.subnet_id,
            Field::FloatingNetworkId => &self.floating_network_id,
            Field::LbMethod => &self.lb_method,
            Field::ManageSecurityGroups => {
                return Some(FieldValue::Flag(self.manage_security_groups))
            }
            Field::NodeSecurityGroup => &self.node_security_group,
        };

        text.as_deref().map(FieldValue::Text)
    }

    /// If security groups are managed, a group to manage has to be known
    fn security_ok(&self) -> bool {
        self.node_security_group.is_some() || !self.manage_security_groups
    }

    /// Whether everything needed to talk to OpenStack has arrived
    pub fn is_ready(&self) -> bool {
        self.security_ok() && REQUIRED_FIELDS.iter().all(|&f| self.get(f).is_some())
    }

    /// Fields holding up readiness, in the order they are checked
    pub fn missing_fields(&self) -> Vec<Field> {
        let mut missing: Vec<_> = REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|&f| self.get(f).is_none())
            .collect();

        if !self.security_ok() {
            missing.push(Field::NodeSecurityGroup);
        }

        missing
    }

    /// Decoded DER/PEM bytes of the endpoint CA certificate, if one was sent
    pub fn decode_tls_ca(&self) -> Result<Option<Vec<u8>>, IntegrationError> {
        self.endpoint_tls_ca
            .as_ref()
            .map(|ca| STANDARD.decode(ca.trim()))
            .transpose()
            .map_err(IntegrationError::from)
    }
}
