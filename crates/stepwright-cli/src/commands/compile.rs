//! Manifest compilation command.

use anyhow::{Context, Result};
use stepwright_compiler::Compiler;
use stepwright_config::{Manifest, load_context, load_manifest};
use stepwright_core::{Step, StepKind};
use tracing::info;

/// Compile every declaration in a manifest and print the steps as JSON.
pub async fn compile(context_path: &str, manifest_path: &str, compact: bool) -> Result<()> {
    let context = load_context(context_path)
        .with_context(|| format!("Failed to load compilation context: {}", context_path))?;
    let manifest = load_manifest(manifest_path)
        .with_context(|| format!("Failed to parse step manifest: {}", manifest_path))?;

    let steps = compile_manifest(Compiler::new(context), manifest).await?;

    let output = if compact {
        serde_json::to_string(&steps)?
    } else {
        serde_json::to_string_pretty(&steps)?
    };
    println!("{}", output);
    Ok(())
}

/// Compile services then steps concurrently, preserving declaration order.
pub async fn compile_manifest(compiler: Compiler, manifest: Manifest) -> Result<Vec<Step>> {
    let prefix = compiler.context().prefix.clone();

    let services = manifest
        .services
        .into_iter()
        .enumerate()
        .map(|(i, decl)| (format!("{}_service_{}", prefix, i), decl, StepKind::Service));
    let steps = manifest
        .steps
        .into_iter()
        .enumerate()
        .map(|(i, decl)| (format!("{}_step_{}", prefix, i), decl, StepKind::Step));

    let handles: Vec<_> = services
        .chain(steps)
        .map(|(name, decl, kind)| {
            let compiler = compiler.clone();
            tokio::task::spawn_blocking(move || compiler.create_step(&name, decl, kind))
        })
        .collect();

    let mut compiled = Vec::with_capacity(handles.len());
    for handle in handles {
        compiled.push(handle.await.context("Step compilation task failed")?);
    }

    info!(steps = compiled.len(), "Compiled manifest");
    Ok(compiled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stepwright_config::{parse_context, parse_manifest};

    #[tokio::test]
    async fn test_compile_manifest_names_and_order() {
        let context = parse_context(
            r#"
            compiler prefix="ci_7" base="/workspace" path="src/app"
            network "shared"
            "#,
        )
        .unwrap();
        let manifest = parse_manifest(
            r#"
            service "db" { image "postgres:16" }
            step "build" {
                image "rust:1.85"
                commands "cargo build"
            }
            step "test" {
                image "rust:1.85"
                commands "cargo test"
            }
            "#,
        )
        .unwrap();

        let steps = compile_manifest(Compiler::new(context), manifest)
            .await
            .unwrap();

        let names: Vec<_> = steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["ci_7_service_0", "ci_7_step_0", "ci_7_step_1"]);

        let aliases: Vec<_> = steps.iter().map(|s| s.alias.as_str()).collect();
        assert_eq!(aliases, vec!["db", "build", "test"]);

        assert_eq!(steps[0].kind, StepKind::Service);
        assert!(steps[0].detached);
        assert_eq!(steps[1].working_dir, "/workspace/src/app");
        assert_eq!(steps[2].networks[1].name, "shared");
        assert_eq!(steps[2].volumes[0], "ci_7_default:/workspace");
    }
}
