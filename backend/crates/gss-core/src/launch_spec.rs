use gss_config::{Credentials, LaunchArgs, LaunchConfig};

const API_ENDPOINT_FLAG: &str = "-apiEndpoint=";
const REDACTED: &str = "<redacted>";

/// Command line for the managed server, assembled once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    args: Vec<String>,
}

impl LaunchSpec {
    /// Order: display flags, networking, extra key/value args, credentials.
    pub fn assemble(launch: &LaunchConfig, extra: &LaunchArgs, credentials: &Credentials) -> Self {
        let mut args = launch.display_flags.clone();
        args.push(format!("-LocalIp={}", launch.local_ip));
        args.push(format!("-Port={}", launch.port));
        args.extend(extra.to_flags());
        args.push(format!("{API_ENDPOINT_FLAG}{}", credentials.api_endpoint));

        Self { args }
    }

    pub fn from_args(args: Vec<String>) -> Self {
        Self { args }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Space-joined command line with credentials masked, for logging.
    pub fn redacted(&self) -> String {
        self.args
            .iter()
            .map(|arg| {
                if arg.starts_with(API_ENDPOINT_FLAG) {
                    format!("{API_ENDPOINT_FLAG}{REDACTED}")
                } else {
                    arg.clone()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}
