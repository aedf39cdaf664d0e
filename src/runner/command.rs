use super::Environment;
use crate::Error;
use std::{
    io::Read,
    path::{Path, PathBuf},
    process::Stdio,
};
use tokio::process::Command;
use tracing::{debug, trace};

/// A single invocation of an external binary
///
/// stdout and stderr share a single pipe, so the captured text is in the
/// order the process wrote it. When an [`Environment`] is attached the child gets exactly that
/// environment, otherwise it inherits ours.
#[derive(Debug, Clone)]
pub struct WineCommand {
    program: PathBuf,
    args: Vec<String>,
    working_dir: Option<PathBuf>,
    env: Option<Environment>,
}

impl WineCommand {
    pub fn new(program: impl AsRef<Path>) -> Self {
        Self {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            working_dir: None,
            env: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.working_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn environment(mut self, env: Environment) -> Self {
        self.env = Some(env);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    pub fn get_environment(&self) -> Option<&Environment> {
        self.env.as_ref()
    }

    /// Run to completion and return the combined output
    ///
    /// A non-zero exit becomes [`Error::ProcessFailed`] carrying the output,
    /// a binary that cannot be started becomes [`Error::Launch`].
    pub async fn output(self) -> Result<String, Error> {
        debug!(
            "Executing: {} {}",
            self.program.display(),
            self.args.join(" ")
        );

        let (reader, writer) = std::io::pipe()?;
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .stdout(Stdio::from(writer.try_clone()?))
            .stderr(Stdio::from(writer));

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        if let Some(env) = &self.env {
            debug!(
                "Environment variables count: {}, total size: {} bytes",
                env.len(),
                env.byte_size()
            );
            trace!("Environment variables: {:?}", env);
            command.env_clear();
            command.envs(env);
        }

        let spawned = command.spawn();
        // The command holds the write ends until dropped, the reader never sees EOF otherwise
        drop(command);
        let mut child = spawned.map_err(|source| Error::Launch {
            program: self.program.clone(),
            source,
        })?;

        let captured = read_to_end(reader).await?;
        let status = child.wait().await?;
        let output = String::from_utf8_lossy(&captured).into_owned();
        debug!("{} output:\n{}", self.program.display(), output);

        if !status.success() {
            debug!("{} exited with {}", self.program.display(), status);
            return Err(Error::ProcessFailed {
                code: status.code(),
                output,
            });
        }

        Ok(output)
    }
}

/// Drain the shared output pipe until every writer is gone
async fn read_to_end(mut reader: std::io::PipeReader) -> Result<Vec<u8>, Error> {
    let captured = tokio::task::spawn_blocking(move || {
        let mut captured = Vec::new();
        reader.read_to_end(&mut captured).map(|_| captured)
    })
    .await
    .map_err(std::io::Error::other)??;
    Ok(captured)
}
