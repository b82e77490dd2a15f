//! Iteration order over (host pattern, package) pairs.

use crate::config::RunConfig;
use crate::types::{HostPattern, PackageSpec};

/// Every pair in host-major order: all packages for the first pattern, then the next.
pub fn pairs(config: &RunConfig) -> impl Iterator<Item = (&HostPattern, &PackageSpec)> {
    config
        .hosts()
        .iter()
        .flat_map(move |host| config.packages().iter().map(move |package| (host, package)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::ScriptedBroker;
    use crate::config::{RawArgs, Settings};

    #[test]
    fn hosts_are_the_outer_loop() {
        let raw = RawArgs {
            hosts: vec!["a,b".into()],
            packages: vec!["httpd".into(), "php".into()],
            ..RawArgs::default()
        };
        let config = RunConfig::validate(raw, &Settings::default(), &ScriptedBroker::new()).unwrap();

        let order: Vec<String> = pairs(&config)
            .map(|(host, package)| format!("{host}:{package}"))
            .collect();
        assert_eq!(order, vec!["a:httpd", "a:php", "b:httpd", "b:php"]);
    }
}
