//! Requires side of the `openstack-integration` relation interface
//!
//! ```no_run
//! use openstack_integration::OpenStackIntegrationRequires;
//!
//! let mut openstack = OpenStackIntegrationRequires::from_charm_dir().unwrap();
//! openstack.dispatch();
//!
//! if openstack.is_ready() {
//!     println!("Talking to {:?}", openstack.auth_url());
//! }
//! ```

pub mod endpoint;
pub mod error;
pub mod fields;
pub mod flags;
pub mod metadata;
pub mod paths;
pub mod relation;

pub use endpoint::{ConnectionState, OpenStackIntegrationRequires, INTERFACE};
pub use error::IntegrationError;
pub use fields::{Field, FieldValue, IntegrationData, REQUIRED_FIELDS};
pub use flags::{Flag, Flags};
pub use relation::{FieldSet, PeerConnection, RelationId, UnitName};
