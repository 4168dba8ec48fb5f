use std::env;
use std::fs;

use tempfile::tempdir;

use openstack_integration::paths::{charm_dir, metadata_path};
use openstack_integration::OpenStackIntegrationRequires;

// Lives in its own test binary, since it changes the process environment
#[test]
fn endpoint_from_charm_dir() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("metadata.yaml"),
        "name: octavia-user\nrequires:\n  cloud:\n    interface: openstack-integration\n",
    )
    .unwrap();

    env::remove_var("CHARM_DIR");
    env::set_var("JUJU_CHARM_DIR", dir.path());

    assert_eq!(charm_dir(), dir.path());
    assert_eq!(metadata_path(), dir.path().join("metadata.yaml"));

    let endpoint = OpenStackIntegrationRequires::from_charm_dir().unwrap();
    assert_eq!(endpoint.name(), "cloud");

    env::remove_var("JUJU_CHARM_DIR");
    env::set_var("CHARM_DIR", dir.path().join("missing"));

    assert!(OpenStackIntegrationRequires::from_charm_dir().is_err());
}
