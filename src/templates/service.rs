//! Service template.

use crate::crd::{Tier, Wordpress};
use crate::store::ManagedKind;
use crate::templates::{object_meta, selector_labels};
use k8s_openapi::api::core::v1::{Service, ServicePort, ServiceSpec};
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

/// Service exposing the pods of a tier
///
/// The database is only reachable inside the cluster; the web tier uses the
/// service type declared on the Wordpress object.
#[must_use]
pub fn service_for(tier: Tier, wordpress: &Wordpress) -> Service {
    let service_type = match tier {
        Tier::Mysql => "ClusterIP".to_string(),
        Tier::Wordpress => wordpress.spec.service_type.clone(),
    };

    Service {
        metadata: object_meta(wordpress, tier, ManagedKind::Service),
        spec: Some(ServiceSpec {
            type_: Some(service_type),
            selector: Some(selector_labels(wordpress, tier)),
            ports: Some(vec![ServicePort {
                name: Some(tier.port_name().to_string()),
                port: tier.port(),
                target_port: Some(IntOrString::String(tier.port_name().to_string())),
                protocol: Some("TCP".to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::fixtures;

    #[test]
    fn test_database_service_stays_internal() {
        let mut wordpress = fixtures::wordpress("blog");
        wordpress.spec.service_type = "LoadBalancer".to_string();

        let service = service_for(Tier::Mysql, &wordpress);
        assert_eq!(service.metadata.name.as_deref(), Some("blog-mysql-service"));
        let spec = service.spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("ClusterIP"));
        assert_eq!(spec.ports.unwrap()[0].port, 3306);
    }

    #[test]
    fn test_web_service_uses_declared_type() {
        let mut wordpress = fixtures::wordpress("blog");
        wordpress.spec.service_type = "LoadBalancer".to_string();

        let spec = service_for(Tier::Wordpress, &wordpress).spec.unwrap();
        assert_eq!(spec.type_.as_deref(), Some("LoadBalancer"));
        assert_eq!(spec.ports.unwrap()[0].port, 80);
        assert_eq!(
            spec.selector,
            Some(selector_labels(&wordpress, Tier::Wordpress))
        );
    }
}
