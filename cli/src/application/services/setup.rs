//! Application service: host preparation steps run before any tier starts.
//!
//! Every step here is fatal: a failed command aborts the host's workflow
//! with `Failed to <step>`. The one exception is the login check, which only
//! flags the mismatch.

use crate::application::ports::RemoteSession;
use crate::application::services::context::{HostContext, Shell};
use crate::domain::peers::peer_files;
use crate::domain::{Phase, SessionError, StepFailure, WorkflowError};

/// Confirm the login, trust the checkout and install prerequisites.
///
/// # Errors
///
/// Fails when the prerequisites cannot be installed or the transport fails.
pub async fn initialize<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
) -> Result<(), WorkflowError> {
    ctx.phase(Phase::Initializing, "");
    let remote = ctx.remote();

    let whoami = shell.run("whoami", false).await?;
    if !whoami.succeeded || whoami.stdout.trim() != ctx.username() {
        tracing::warn!(
            host = ctx.host.name(),
            expected = ctx.username(),
            actual = whoami.stdout.trim(),
            "login check failed"
        );
        ctx.phase(Phase::Failed, "Failed to login");
    }

    let safe_dir = format!(
        "git config --global --add safe.directory {}",
        remote.checkout_dir
    );
    shell
        .attempt(&safe_dir, false, "mark checkout as safe directory")
        .await?;

    shell
        .require(&remote.prerequisites, true, "install prerequisites")
        .await?;
    Ok(())
}

/// Create the shared deploy root with group ownership and default ACLs.
///
/// Does nothing when the directory already exists.
///
/// # Errors
///
/// Fails on the first command that does not succeed.
pub async fn provision<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
) -> Result<(), WorkflowError> {
    ctx.phase(Phase::Provisioning, "");
    let remote = ctx.remote();
    let root = &remote.deploy_root;

    if shell.run(&format!("test -d {root}"), false).await?.succeeded {
        return Ok(());
    }

    let group = &remote.group;
    let steps = [
        (format!("mkdir -p {root}"), "create deploy directory"),
        (format!("chown root:{group} {root}"), "set deploy directory owner"),
        (format!("chmod 2775 {root}"), "set deploy directory mode"),
        (format!("setfacl -d -m g:{group}:rwx {root}"), "set default group ACL"),
        (format!("setfacl -d -m o::0 {root}"), "set default other ACL"),
    ];
    for (command, step) in &steps {
        shell.require(command, true, step).await?;
    }
    Ok(())
}

/// Bring the checkout to the tip of the configured repository.
///
/// # Errors
///
/// Fails when pull or clone fails, or no checkout exists afterwards.
pub async fn update<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
) -> Result<(), WorkflowError> {
    ctx.phase(Phase::Updating, "");
    let remote = ctx.remote();
    let checkout = &remote.checkout_dir;
    let has_git = format!("test -d {checkout}/.git");

    if shell.run(&has_git, false).await?.succeeded {
        let pull = format!("cd {checkout} && git reset --hard HEAD && git pull");
        shell.require(&pull, false, "pull repository").await?;
        return Ok(());
    }

    let clone = format!(
        "rm -rf {checkout} && git clone {} {checkout}",
        remote.repository
    );
    shell.require(&clone, false, "clone repository").await?;
    shell
        .require(&has_git, false, "create checkout directory")
        .await?;
    Ok(())
}

/// Install dependencies and build the application.
///
/// # Errors
///
/// Fails when either command fails.
pub async fn build<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
) -> Result<(), WorkflowError> {
    let remote = ctx.remote();
    let app = remote.app_path();

    ctx.phase(Phase::InstallingDependencies, "");
    let install = format!("cd {app} && {}", remote.install_command);
    shell.require(&install, true, "install dependencies").await?;

    ctx.phase(Phase::Building, "");
    let build = format!("cd {app} && {}", remote.build_command);
    shell.require(&build, true, "build application").await?;
    Ok(())
}

/// Install this host's generated peer files into the active package.
///
/// # Errors
///
/// Fails when a file cannot be serialized or uploaded.
pub async fn configure<S: RemoteSession>(
    ctx: &HostContext,
    shell: &Shell<'_, S>,
) -> Result<(), WorkflowError> {
    ctx.phase(Phase::Configuring, "");
    let package = ctx.package_path();

    for file in peer_files(ctx.topology(), ctx.host.name(), ctx.variant()) {
        let remote_path = format!("{package}/{}", file.file_name);
        let bytes = file.to_json().map_err(|e| {
            tracing::error!(host = ctx.host.name(), file = %file.file_name, "serialize peer file: {e}");
            StepFailure(format!("write {}", file.file_name))
        })?;
        match shell.session().upload_bytes(&bytes, &remote_path).await {
            Ok(()) => ctx.phase(Phase::Configuring, &format!("Installed config '{remote_path}'")),
            Err(SessionError::Transfer { message, .. }) => {
                tracing::warn!(host = ctx.host.name(), remote_path, message, "peer file upload failed");
                return Err(StepFailure(format!("install {}", file.file_name)).into());
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
