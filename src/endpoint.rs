//! Requires side of the `openstack-integration` interface
//!
//! Charms that want to use native OpenStack features relate to the OpenStack integrator, which
//! hands over credentials and network configuration so the charm doesn't need cloud credentials
//! of its own.
//!
//! The endpoint raises these flags:
//!
//! * `endpoint.{name}.joined` while a connection to the integrator exists. Removed
//!   automatically when the relation is broken.
//! * `endpoint.{name}.ready` once every required field has arrived. Removed automatically when
//!   the data becomes incomplete or the relation goes away.
//!
//! Neither should be cleared by the charm.

use log::{debug, info, warn};

use crate::error::IntegrationError;
use crate::fields::{Field, FieldValue, IntegrationData};
use crate::flags::{expand_name, Flag, Flags};
use crate::metadata::Metadata;
use crate::paths::metadata_path;
use crate::relation::{FieldSet, PeerConnection, RelationId, UnitName};

/// Name of the interface this endpoint speaks
pub const INTERFACE: &str = "openstack-integration";

/// Which connection, if any, fields are read from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectionState<'a> {
    /// Never joined, or the relation was broken
    Disconnected,

    /// The one supported topology: a single integrator application
    Single(&'a PeerConnection),

    /// More than one integrator is related. Nothing is read until only one is left.
    Ambiguous(usize),
}

macro_rules! text_accessors {
    ($($(#[$meta:meta])* $name:ident),* $(,)?) => {
        $(
            $(#[$meta])*
            pub fn $name(&self) -> Option<&str> {
                self.data.$name.as_deref()
            }
        )*
    };
}

#[derive(Debug, Clone)]
pub struct OpenStackIntegrationRequires {
    name: String,
    relations: Vec<PeerConnection>,
    data: IntegrationData,
    flags: Flags,
}

impl OpenStackIntegrationRequires {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            relations: vec![],
            data: IntegrationData::default(),
            flags: Flags::default(),
        }
    }

    /// Create the endpoint for whichever relation the charm declares with this interface
    pub fn from_metadata(metadata: &Metadata) -> Result<Self, IntegrationError> {
        let endpoints = metadata.endpoints_for(INTERFACE);

        match endpoints.as_slice() {
            [] => Err(IntegrationError::EndpointNotFound(
                metadata.name.clone(),
                INTERFACE.to_string(),
            )),
            [name] => Ok(Self::new(*name)),
            [name, ..] => {
                info!(
                    "Charm {} has several {} endpoints, using `{}`",
                    metadata.name, INTERFACE, name
                );
                Ok(Self::new(*name))
            }
        }
    }

    /// Create the endpoint from the metadata of the charm being run
    pub fn from_charm_dir() -> Result<Self, IntegrationError> {
        Self::from_metadata(&Metadata::load(metadata_path())?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> ConnectionState<'_> {
        match self.relations.as_slice() {
            [] => ConnectionState::Disconnected,
            [conn] => ConnectionState::Single(conn),
            many => ConnectionState::Ambiguous(many.len()),
        }
    }

    pub fn relations(&self) -> &[PeerConnection] {
        &self.relations
    }

    /// Rebuild the typed snapshot from the active connection
    fn refresh(&mut self) {
        let data = match self.connection() {
            ConnectionState::Single(conn) => IntegrationData::from_fields(&conn.received),
            ConnectionState::Ambiguous(count) => {
                warn!(
                    "Endpoint {} is related to {} integrators, expected one",
                    self.name, count
                );
                IntegrationData::default()
            }
            ConnectionState::Disconnected => IntegrationData::default(),
        };

        self.data = data;
    }

    /// A relation to the integrator was established
    ///
    /// Joining an id that is already known adds its units and data to the existing connection.
    pub fn on_joined(&mut self, conn: PeerConnection) {
        info!("Endpoint {} joined relation {}", self.name, conn.id);

        match self.relations.iter_mut().find(|r| r.id == conn.id) {
            Some(existing) => {
                for unit in conn.units {
                    existing.join_unit(unit);
                }
                existing.received.merge(conn.received);
            }
            None => self.relations.push(conn),
        }

        self.flags.set(Flag::Joined);
        self.flags.set(Flag::Changed);
        self.refresh();
    }

    /// Another remote unit joined relation `id`
    pub fn on_unit_joined(&mut self, id: &RelationId, unit: UnitName) {
        match self.relations.iter_mut().find(|r| &r.id == id) {
            Some(conn) => {
                debug!("Unit {} joined relation {}", unit, id);
                conn.join_unit(unit);
            }
            None => {
                let mut conn = PeerConnection::new(id.clone());
                conn.join_unit(unit);
                self.on_joined(conn);
            }
        }
    }

    /// A remote unit left relation `id`
    ///
    /// Data it published is kept until the relation itself is broken.
    pub fn on_unit_departed(&mut self, id: &RelationId, unit: &UnitName) {
        if let Some(conn) = self.relations.iter_mut().find(|r| &r.id == id) {
            debug!("Unit {} departed relation {}", unit, id);
            conn.depart_unit(unit);
        }
    }

    /// New data arrived on relation `id`
    pub fn receive(&mut self, id: &RelationId, fields: FieldSet) {
        let conn = match self.relations.iter_mut().find(|r| &r.id == id) {
            Some(conn) => conn,
            None => {
                warn!("Ignoring data for unknown relation {}", id);
                return;
            }
        };

        conn.received.merge(fields);
        self.flags.set(Flag::Changed);
        self.refresh();
    }

    /// Acknowledge new relation data and work out whether it is complete
    pub fn on_changed(&mut self) {
        let ready = self.is_ready();
        self.flags.toggle(Flag::Ready, ready);
        self.flags.clear(Flag::Changed);

        if ready {
            info!("Endpoint {} is ready", self.name);
        } else {
            debug!(
                "Endpoint {} still waiting on {:?}",
                self.name,
                self.missing_fields()
            );
        }
    }

    /// There is no connection to the integrator
    pub fn on_disconnected(&mut self) {
        self.flags.clear(Flag::Ready);
    }

    /// Relation `id` was torn down
    pub fn on_broken(&mut self, id: &RelationId) {
        info!("Endpoint {} left relation {}", self.name, id);
        self.relations.retain(|r| &r.id != id);
        self.refresh();

        if self.relations.is_empty() {
            self.flags.clear(Flag::Joined);
            self.on_disconnected();
        } else {
            self.flags.set(Flag::Changed);
        }
    }

    /// Run every handler whose trigger currently holds
    pub fn dispatch(&mut self) {
        if self.flags.is_set(Flag::Changed) {
            self.on_changed();
        }

        if !self.flags.is_set(Flag::Joined) {
            self.on_disconnected();
        }
    }

    /// Whether the request for this instance has been completed
    pub fn is_ready(&self) -> bool {
        match self.connection() {
            ConnectionState::Single(_) => self.data.is_ready(),
            _ => false,
        }
    }

    pub fn missing_fields(&self) -> Vec<Field> {
        self.data.missing_fields()
    }

    pub fn is_joined(&self) -> bool {
        self.flags.is_set(Flag::Joined)
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn flag_name(&self, flag: Flag) -> String {
        expand_name(&self.name, flag)
    }

    /// Expanded names of the flags currently raised
    pub fn active_flags(&self) -> Vec<String> {
        self.flags.active(&self.name)
    }

    pub fn data(&self) -> &IntegrationData {
        &self.data
    }

    /// Look a field up by its relation key
    ///
    /// Returns `None` for unknown keys and for fields that haven't arrived.
    /// `manage_security_groups` is always present.
    pub fn get_field(&self, name: &str) -> Option<FieldValue<'_>> {
        name.parse::<Field>()
            .ok()
            .and_then(|field| self.data.get(field))
    }

    text_accessors!(
        /// The authentication endpoint URL
        auth_url,
        region,
        username,
        password,
        user_domain_name,
        project_domain_name,
        /// The project name, also known as the tenant ID
        project_name,
        /// Base64-encoded CA certificate for the authentication endpoint
        endpoint_tls_ca,
        subnet_id,
        floating_network_id,
        lb_method,
        /// ID of the security group to manage if `manage_security_groups` is set
        node_security_group,
    );

    /// Whether the load balancer should manage security group rules itself
    pub fn manage_security_groups(&self) -> bool {
        self.data.manage_security_groups
    }
}
