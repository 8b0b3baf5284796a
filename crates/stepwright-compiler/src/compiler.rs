//! Step assembly.
//!
//! [`Compiler::create_step`] turns one declaration into a [`Step`]. It is a
//! pure function of the declaration and the shared [`CompilationContext`], so
//! a single compiler can be shared across threads to compile every step of a
//! pipeline concurrently.

use std::collections::HashMap;
use std::sync::Arc;
use stepwright_core::declaration::DeclBackendOptions;
use stepwright_core::image::match_image;
use stepwright_core::step::{
    BackendOptions, Conn, FAILURE_FAIL, KubernetesBackendOptions, Resources, Toleration,
};
use stepwright_core::{PluginClassifier, StatusGate, Step, StepDeclaration, StepId, StepKind};
use tracing::{debug, error};

use crate::context::CompilationContext;
use crate::environment::EnvironmentBuilder;
use crate::limits::resolve_limits;
use crate::naming::{ENV_STEP_NAME, ENV_WORKSPACE, default_network, join_path, workspace_volume};
use crate::registry::resolve_auth;
use crate::settings::settings_to_env;

/// Compiles step declarations against one pipeline's context.
#[derive(Debug, Clone)]
pub struct Compiler {
    context: Arc<CompilationContext>,
}

impl Compiler {
    pub fn new(context: CompilationContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    pub fn context(&self) -> &CompilationContext {
        &self.context
    }

    /// Compile `decl` into a step scheduled under `name`.
    pub fn create_step(&self, name: &str, decl: StepDeclaration, kind: StepKind) -> Step {
        let ctx = &self.context;

        let detached = kind == StepKind::Service || decl.detached;

        let working_dir = if !detached || !decl.commands.is_empty() {
            self.step_workdir(&decl.directory)
        } else {
            String::new()
        };

        let environment = self.step_environment(name, &decl, detached);

        let privileged =
            decl.privileged || (match_image(&decl.image, &ctx.escalated) && decl.is_plugin());

        let auth_config = resolve_auth(&decl.image, &ctx.registries);

        let limits = resolve_limits(&decl.limits, &ctx.limits);

        let networks: Vec<Conn> = std::iter::once(Conn {
            name: default_network(&ctx.prefix),
            aliases: vec![decl.name.clone()],
        })
        .chain(ctx.networks.iter().map(|network| Conn {
            name: network.clone(),
            aliases: Vec::new(),
        }))
        .collect();

        let mut volumes = Vec::with_capacity(1 + ctx.volumes.len() + decl.volumes.len());
        if !ctx.local {
            volumes.push(workspace_volume(&ctx.prefix, &ctx.base));
        }
        volumes.extend(ctx.volumes.iter().cloned());
        volumes.extend(decl.volumes.iter().map(ToString::to_string));

        let on_success = decl.when.includes_status_success();
        let on_failure = decl.when.includes_status_failure();

        let failure = if decl.failure.is_empty() {
            FAILURE_FAIL.to_string()
        } else {
            decl.failure
        };

        let backend_options = backend_options(decl.backend_options);

        let step = Step {
            name: name.to_string(),
            uuid: StepId::new(),
            kind,
            alias: decl.name,
            image: decl.image,
            pull: decl.pull,
            detached,
            privileged,
            working_dir,
            environment,
            commands: decl.commands,
            extra_hosts: decl.extra_hosts,
            volumes,
            tmpfs: decl.tmpfs,
            devices: decl.devices,
            networks,
            dns: decl.dns,
            dns_search: decl.dns_search,
            sysctls: decl.sysctls,
            limits,
            auth_config,
            on_success,
            on_failure,
            failure,
            network_mode: decl.network_mode,
            ipc_mode: decl.ipc_mode,
            backend_options,
        };

        debug!(step = %step.name, uuid = %step.uuid, image = %step.image, "Compiled step");
        step
    }

    fn step_workdir(&self, directory: &str) -> String {
        if directory.starts_with('/') {
            return directory.to_string();
        }
        join_path(&[&self.context.base, &self.context.path, directory])
    }

    // Precedence, lowest first: declared env, global env, workspace/step name,
    // plugin settings, requested secrets.
    fn step_environment(
        &self,
        name: &str,
        decl: &StepDeclaration,
        detached: bool,
    ) -> HashMap<String, String> {
        let ctx = &self.context;

        let mut plugin_env = HashMap::new();
        if !detached {
            let secrets = ctx.secrets.available_for(decl);
            if let Err(e) = settings_to_env(&decl.settings, &mut plugin_env, &secrets) {
                error!(step = %name, error = %e, "Failed to translate plugin settings");
            }
        }

        let requested_env: HashMap<String, String> = decl
            .secrets
            .iter()
            .filter_map(|requested| {
                ctx.secrets
                    .requested(&requested.source, decl)
                    .map(|value| (requested.target.to_uppercase(), value.to_string()))
            })
            .collect();

        EnvironmentBuilder::new()
            .merge(decl.environment.clone())
            .merge(ctx.environment.clone())
            .set(ENV_WORKSPACE, join_path(&[&ctx.base, &ctx.path]))
            .set(ENV_STEP_NAME, name)
            .merge(plugin_env)
            .merge(requested_env)
            .build()
    }
}

fn backend_options(declared: DeclBackendOptions) -> BackendOptions {
    let kubernetes = declared.kubernetes;
    BackendOptions {
        kubernetes: KubernetesBackendOptions {
            resources: Resources {
                requests: kubernetes.requests,
                limits: kubernetes.limits,
            },
            service_account_name: kubernetes.service_account_name,
            node_selector: kubernetes.node_selector,
            tolerations: kubernetes
                .tolerations
                .into_iter()
                .map(|t| Toleration {
                    key: t.key,
                    operator: t.operator,
                    value: t.value,
                    effect: t.effect,
                    toleration_seconds: t.toleration_seconds,
                })
                .collect(),
        },
    }
}
