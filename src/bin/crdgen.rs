//! # CRD Generator
//!
//! Prints the `Wordpress` CustomResourceDefinition as YAML.
//!
//! ```bash
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use kube::CustomResourceExt;
use wordpress_operator::crd::Wordpress;

fn main() -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(&Wordpress::crd())?;
    print!("{yaml}");
    Ok(())
}
