//! # Tiers
//!
//! The two roles a managed sub-resource can belong to.

use std::fmt;

/// Application tier
///
/// The database tier must be ready before the Wordpress tier is provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// MySQL backing store
    Mysql,
    /// Wordpress web tier
    Wordpress,
}

impl Tier {
    /// Short name used in sub-resource names (`<owner>-mysql-pvc`, `<owner>-wp-service`)
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        match self {
            Tier::Mysql => "mysql",
            Tier::Wordpress => "wp",
        }
    }

    /// Value of the `app.kubernetes.io/component` label
    #[must_use]
    pub fn component(&self) -> &'static str {
        match self {
            Tier::Mysql => "database",
            Tier::Wordpress => "frontend",
        }
    }

    #[must_use]
    pub fn default_image(&self) -> &'static str {
        match self {
            Tier::Mysql => "mysql:8.0",
            Tier::Wordpress => "wordpress:6",
        }
    }

    /// Port the tier container listens on
    #[must_use]
    pub fn port(&self) -> i32 {
        match self {
            Tier::Mysql => 3306,
            Tier::Wordpress => 80,
        }
    }

    #[must_use]
    pub fn port_name(&self) -> &'static str {
        match self {
            Tier::Mysql => "mysql",
            Tier::Wordpress => "http",
        }
    }

    /// Path where the tier persistent volume is mounted
    #[must_use]
    pub fn data_path(&self) -> &'static str {
        match self {
            Tier::Mysql => "/var/lib/mysql",
            Tier::Wordpress => "/var/www/html",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
