//! Errors for the openstack-integration endpoint
//!
//! Only the loading and decoding helpers return these. Incomplete relation data is never an
//! error, it just leaves the endpoint not ready.

use std::io::Error as IOError;

use base64::DecodeError;
use ex::io::Error as ExIOError;
use failure::Fail;
use serde_yaml::Error as YamlError;

#[derive(Debug, Fail)]
pub enum IntegrationError {
    #[fail(display = "I/O error: {}", _0)]
    IOError(#[fail(cause)] IOError),

    #[fail(display = "I/O error: {}", _0)]
    ExIOError(#[fail(cause)] ExIOError),

    #[fail(display = "YAML Error: {}", _0)]
    YamlError(#[fail(cause)] YamlError),

    #[fail(display = "Failed to decode endpoint CA certificate: {}", _0)]
    CertificateError(#[fail(cause)] DecodeError),

    #[fail(display = "Couldn't parse relation id `{}`: {}", _0, _1)]
    RelationIdError(String, String),

    #[fail(display = "Couldn't parse unit name `{}`: {}", _0, _1)]
    UnitNameError(String, String),

    #[fail(display = "Unknown relation field `{}`", _0)]
    UnknownField(String),

    #[fail(display = "Charm `{}` doesn't require the `{}` interface", _0, _1)]
    EndpointNotFound(String, String),
}

impl From<IOError> for IntegrationError {
    fn from(err: IOError) -> Self {
        IntegrationError::IOError(err)
    }
}

impl From<ExIOError> for IntegrationError {
    fn from(err: ExIOError) -> Self {
        IntegrationError::ExIOError(err)
    }
}

impl From<YamlError> for IntegrationError {
    fn from(err: YamlError) -> Self {
        IntegrationError::YamlError(err)
    }
}

impl From<DecodeError> for IntegrationError {
    fn from(err: DecodeError) -> Self {
        IntegrationError::CertificateError(err)
    }
}

impl From<IntegrationError> for String {
    fn from(err: IntegrationError) -> Self {
        format!("{}", err)
    }
}
