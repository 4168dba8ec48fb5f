use std::path::PathBuf;

use serde_yaml::Value;

use openstack_integration::metadata::{Metadata, Relation};
use openstack_integration::{
    FieldSet, IntegrationData, OpenStackIntegrationRequires, PeerConnection, RelationId, UnitName,
};

#[test]
fn parse_metadata_yaml() {
    let metadata = Metadata::load(PathBuf::from("tests/examples/metadata.yaml")).unwrap();

    assert_eq!(metadata.name, "kubernetes-control-plane");
    assert_eq!(
        metadata.requires.get("openstack"),
        Some(&Relation {
            interface: "openstack-integration".into(),
        })
    );
    assert_eq!(metadata.provides.len(), 1);
    assert_eq!(metadata.peers.len(), 1);
    assert_eq!(metadata.endpoints_for("openstack-integration"), vec!["openstack"]);
    assert!(metadata.endpoints_for("aws-integration").is_empty());

    let endpoint = OpenStackIntegrationRequires::from_metadata(&metadata).unwrap();
    assert_eq!(endpoint.name(), "openstack");
}

#[test]
fn metadata_without_interface() {
    let yaml = b"name: plain\nrequires:\n  db:\n    interface: pgsql\n";
    let metadata = Metadata::load_from_bytes(yaml).unwrap();

    let err = OpenStackIntegrationRequires::from_metadata(&metadata).unwrap_err();
    assert_eq!(
        String::from(err),
        "Charm `plain` doesn't require the `openstack-integration` interface"
    );
}

#[test]
fn parse_complete_relation() {
    let conn = PeerConnection::load("tests/examples/relation-ready.yaml").unwrap();

    assert_eq!(conn.id, RelationId::new("openstack", 3));
    assert_eq!(conn.units, vec![UnitName::new("openstack-integrator", 0)]);

    let data = IntegrationData::from_fields(&conn.received);
    assert_eq!(
        data,
        IntegrationData {
            auth_url: Some("https://keystone.example.com:5000/v3".into()),
            region: Some("RegionOne".into()),
            username: Some("admin".into()),
            password: Some("hunter2".into()),
            user_domain_name: Some("admin_domain".into()),
            project_domain_name: Some("admin_domain".into()),
            project_name: Some("admin".into()),
            endpoint_tls_ca: Some("Q0VSVElGSUNBVEU=".into()),
            subnet_id: Some("5be7ae7a-4298-4ea0-a2ce-b5bf8032f6a5".into()),
            floating_network_id: Some("93e2d1fd-5d5c-4e3b-9a9f-8c1c51f4dd7c".into()),
            lb_method: Some("ROUND_ROBIN".into()),
            manage_security_groups: true,
            node_security_group: Some("sg-1".into()),
        }
    );
    assert!(data.is_ready());
}

#[test]
fn parse_partial_relation() {
    let conn = PeerConnection::load("tests/examples/relation-partial.yaml").unwrap();
    let data = IntegrationData::from_fields(&conn.received);

    assert_eq!(conn.received.get("password"), Some(&Value::Null));
    assert_eq!(data.password, None);
    // Not a string, so treated as never sent
    assert_eq!(data.project_domain_name, None);
    assert!(data.manage_security_groups);
    assert!(!data.is_ready());
}

#[test]
fn parse_field_set() {
    let fields = FieldSet::load_from_bytes(b"auth_url: u\nregion: ~\n").unwrap();

    assert_eq!(fields.get_str("auth_url"), Some("u"));
    assert_eq!(fields.get_str("region"), None);
    assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["auth_url", "region"]);
}

#[test]
fn bad_relation_id() {
    let err = PeerConnection::load_from_bytes(b"id: openstack\n").unwrap_err();

    assert!(String::from(err).contains("openstack"));
}
