//! # pyedit
//!
//! Format-preserving structural editing of Python source.
//!
//! This crate provides:
//! - A lossless concrete syntax tree over Python source ([`cst::SourceTree`])
//! - Single-purpose, idempotent transformers (rename, parameters,
//!   decorators, attributes, dunder generation, async conversion)
//! - Targets that address classes, methods and functions by name across a
//!   working set of files
//! - Atomic multi-file transactions with rollback on failure
//! - Dry runs that report unified diffs without touching disk
//!
//! Operations never return errors to their caller: every operation returns
//! an [`EditResult`](result::EditResult) whose `success` flag is the sole
//! truth value.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pyedit::prelude::*;
//!
//! let session = Session::open("src")?;
//!
//! let run = session.find_class("Job").find_method("run");
//! let result = run.add_parameter(
//!     ParameterSpec::new("timeout").annotation("int").default_value("30"),
//! );
//! println!("{}", result.diff.unwrap_or_default());
//! # Ok::<(), pyedit::error::EditError>(())
//! ```
//!
//! ## Transactions
//!
//! ```rust,no_run
//! use pyedit::prelude::*;
//!
//! let session = Session::open("src")?;
//! let mut tx = session.begin_transaction()?;
//! session.find_class("User").rename("Account");
//! session.find_function("load_user").rename("load_account");
//!
//! let batch = tx.commit();
//! assert!(batch.success());
//! # Ok::<(), pyedit::error::EditError>(())
//! ```

pub mod cst;
pub mod diff;
pub mod error;
pub mod finding;
pub mod lang;
pub mod mover;
pub mod resolver;
pub mod result;
pub mod session;
pub mod target;
pub mod transaction;
pub mod transform;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::cst::{ElementPath, SourceTree, TextEdit};
    pub use crate::diff::{DiffSummary, combine_diffs, generate_diff};
    pub use crate::error::{EditError, ErrorKind, Result};
    pub use crate::finding::{Finding, FindingList, FindingSummary, Severity};
    pub use crate::mover::{FileChange, ModuleMover, MoveRequest, ProjectMover};
    pub use crate::resolver::{Resolution, TargetResolver};
    pub use crate::result::{BatchResult, EditResult, ErrorInfo};
    pub use crate::session::{LineMatch, Session, SessionConfig, Transaction};
    pub use crate::target::{
        AttributeHost, BodyEditable, ClassTarget, ContentSource, Decoratable, Deletable,
        ErrorTarget, FileTarget, FunctionTarget, MatchEditable, MethodTarget, ModuleEditable,
        Movable, Navigable, Renameable, SignatureEditable, Target, TargetKind, TargetList,
    };
    pub use crate::transaction::{PendingChange, TransactionManager, TransactionState};
    pub use crate::transform::{
        BodyPosition, DefinitionSpec, DunderKind, MatchPosition, ParameterPosition, ParameterSpec,
        Pipeline, Transformed, Transformer,
    };
}

pub use prelude::*;
