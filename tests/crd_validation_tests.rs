//! # CRD Validation Tests
//!
//! Checks Wordpress manifests as users write them and the generated
//! CustomResourceDefinition that the API server validates them against.

mod common;

use kube::CustomResourceExt;
use wordpress_operator::crd::{Tier, Wordpress, WordpressPhase};

#[test]
fn test_fixture_manifest_deserializes() {
    let wordpress = common::wordpress("blog", "mysql:8.4", "wordpress:6.5");

    assert_eq!(wordpress.metadata.namespace.as_deref(), Some(common::NAMESPACE));
    assert_eq!(wordpress.spec.mysql.image_or_default(Tier::Mysql), "mysql:8.4");
    assert_eq!(wordpress.spec.mysql.storage_size_or_default(), "2Gi");
    // Unset web tier storage uses the default
    assert_eq!(wordpress.spec.wordpress.storage_size_or_default(), "1Gi");
    assert_eq!(wordpress.spec.credentials_secret_ref.key, "password");
    assert!(wordpress.status.is_none());
}

#[test]
fn test_full_manifest_deserializes() {
    let yaml = r#"
apiVersion: wordpress.gopkg.blogpost.com/v1alpha1
kind: Wordpress
metadata:
  name: shop
  namespace: stores
spec:
  credentialsSecretRef:
    name: shop-db
    key: root-password
  mysql:
    storageSize: 20Gi
    storageClassName: fast-ssd
    resources:
      requests:
        memory: 1Gi
  wordpress:
    image: wordpress:6.5-apache
    replicas: 3
  serviceType: LoadBalancer
status:
  phase: Ready
  message: All sub-resources are ready
"#;
    let wordpress: Wordpress = serde_yaml::from_str(yaml).unwrap();

    assert_eq!(wordpress.spec.credentials_secret_ref.key, "root-password");
    assert_eq!(wordpress.spec.mysql.image_or_default(Tier::Mysql), "mysql:8.0");
    assert_eq!(
        wordpress.spec.mysql.storage_class_name.as_deref(),
        Some("fast-ssd")
    );
    assert_eq!(wordpress.spec.wordpress.replicas_or_default(), 3);
    assert_eq!(wordpress.spec.service_type, "LoadBalancer");
    assert_eq!(
        wordpress.status.and_then(|s| s.phase),
        Some(WordpressPhase::Ready)
    );
}

#[test]
fn test_manifest_without_credentials_is_rejected() {
    let yaml = r"
apiVersion: wordpress.gopkg.blogpost.com/v1alpha1
kind: Wordpress
metadata:
  name: broken
spec:
  mysql:
    image: mysql:8
";
    let result: Result<Wordpress, _> = serde_yaml::from_str(yaml);
    assert!(result.is_err());
}

#[test]
fn test_crd_requires_credentials_and_exposes_status() {
    let crd = serde_json::to_value(Wordpress::crd()).unwrap();
    let version = &crd["spec"]["versions"][0];

    assert_eq!(version["name"], "v1alpha1");
    assert!(version["subresources"]["status"].is_object());

    let spec_schema = &version["schema"]["openAPIV3Schema"]["properties"]["spec"];
    let required: Vec<&str> = spec_schema["required"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(serde_json::Value::as_str)
        .collect();
    assert_eq!(required, vec!["credentialsSecretRef"]);

    let columns: Vec<&str> = version["additionalPrinterColumns"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(columns, vec!["Phase", "Message", "Ready"]);
}
