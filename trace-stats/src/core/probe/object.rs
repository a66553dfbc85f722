//! # Object
//!
//! A probe object is a compiled BPF ELF file loaded at runtime. It is expected
//! to hold a single program, attached to a tracepoint, and the maps that
//! program fills.

use std::{fmt, path::Path};

use libbpf_rs::{Link, Object, ObjectBuilder};
use log::{debug, info, warn};

use super::Scoped;
use crate::{cli::StatsConfig, core::error::StatsError};

/// Kernel hook a program is attached to, identified by a tracepoint
/// category and an event within that category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Hook {
    pub(crate) category: String,
    pub(crate) event: String,
}

impl Hook {
    pub(crate) fn tracepoint(category: &str, event: &str) -> Self {
        Self {
            category: category.to_string(),
            event: event.to_string(),
        }
    }

    /// Tracepoint hit when an XDP program returns an error or an invalid
    /// action.
    pub(crate) fn xdp_exception() -> Self {
        Self::tracepoint("xdp", "xdp_exception")
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.category, self.event)
    }
}

fn release_object(obj: Object) {
    debug!("Releasing BPF object");
    drop(obj);
}

/// A loaded probe object with its program attached.
///
/// Owns every kernel resource coming from the object file. Maps resolved
/// from it borrow it and can't outlive it. Dropping it, or calling
/// `detach()`, detaches the program then closes the object; if the process
/// is killed instead the kernel reclaims both.
pub(crate) struct ProbeObject {
    // Keep the link first: fields are dropped in declaration order and the
    // program must be detached before the object is closed.
    link: Link,
    object: Object,
    program: String,
    hook: Hook,
}

impl ProbeObject {
    /// Open the object file, load it in the kernel and attach its first
    /// program to `hook`. Either everything succeeds or nothing is kept.
    pub(crate) fn load(config: &StatsConfig, hook: &Hook) -> Result<Self, StatsError> {
        let path = config.filename.as_path();

        let open = ObjectBuilder::default()
            .open_file(path)
            .map_err(|source| StatsError::LoadOpen {
                path: path.to_path_buf(),
                source,
            })?;

        // Loading makes the kernel verifier check all programs of the object.
        // On failure the open object is consumed and closed by libbpf-rs.
        let mut object = Scoped::new(
            open.load().map_err(|source| StatsError::VerifierReject {
                path: path.to_path_buf(),
                source,
            })?,
            release_object,
        );

        let (program, link) = Self::attach_first(&mut object, path, hook)?;

        if config.verbose {
            info!("Success: Loaded BPF-object({})", path.display());
            info!("Program {program} attached to tracepoint {hook}");
        }

        Ok(Self {
            link,
            object: object.handoff(),
            program,
            hook: hook.clone(),
        })
    }

    fn attach_first(
        object: &mut Object,
        path: &Path,
        hook: &Hook,
    ) -> Result<(String, Link), StatsError> {
        let nprogs = object.progs().count();
        if nprogs > 1 {
            warn!(
                "{} programs found in {}, only the first one is attached",
                nprogs,
                path.display()
            );
        }

        let prog = object
            .progs_mut()
            .next()
            .ok_or_else(|| StatsError::ProgramNotFound {
                path: path.to_path_buf(),
            })?;
        let program = prog.name().to_string_lossy().into_owned();

        debug!("Attaching program {program} to tracepoint {hook}");
        let link = prog
            .attach_tracepoint(
                libbpf_rs::TracepointCategory::Custom(hook.category.clone()),
                &hook.event,
            )
            .map_err(|source| StatsError::Attach {
                program: program.clone(),
                hook: hook.to_string(),
                source,
            })?;

        Ok((program, link))
    }

    pub(crate) fn object(&self) -> &Object {
        &self.object
    }

    pub(crate) fn program(&self) -> &str {
        &self.program
    }

    pub(crate) fn hook(&self) -> &Hook {
        &self.hook
    }

    /// Detach the program from its hook and release the object.
    pub(crate) fn detach(self) {
        let Self {
            link,
            object,
            program,
            hook,
        } = self;

        drop(link);
        info!("Detached program {program} from tracepoint {hook}");
        release_object(object);
    }
}
