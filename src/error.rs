use std::convert::Infallible;

use derive_more::{Display, From};

use crate::object_id::ObjectId;

/// Everything that can go wrong while operating on a repository.
///
/// The [`Display`] form of each variant is the single message shown to
/// the user when a command aborts.
#[derive(Debug, Display, From)]
pub enum Error {
    #[from]
    #[display(fmt = "I/O error: {}", _0)]
    IO(std::io::Error),
    #[from]
    #[display(fmt = "malformed repository state: {}", _0)]
    Serde(serde_json::Error),
    #[display(fmt = "Object {} is missing from the store.", _0)]
    MissingObject(ObjectId),
    #[display(fmt = "Branch {} points at missing commit {}.", branch, id)]
    DanglingReference { branch: String, id: ObjectId },
    #[display(fmt = "Commits {} and {} share no history.", _0, _1)]
    Unrelated(ObjectId, ObjectId),

    #[display(fmt = "Not in an initialized revision directory.")]
    NotInitialized,
    #[display(fmt = "A revision control system already exists in the current directory.")]
    AlreadyInitialized,
    #[display(fmt = "A branch with that name does not exist.")]
    NoSuchBranch(String),
    #[display(fmt = "No such branch exists.")]
    NoSuchCheckoutBranch(String),
    #[display(fmt = "No commit with that id exists.")]
    NoSuchCommit(String),
    #[display(fmt = "Found no commit with that message.")]
    NoCommitWithMessage(String),
    #[display(fmt = "File does not exist.")]
    FileDoesNotExist(String),
    #[display(fmt = "File does not exist in that commit.")]
    PathNotInCommit(String),

    #[display(fmt = "Commit id prefix {} is ambiguous.", _0)]
    AmbiguousCommit(String),
    #[display(fmt = "Invalid path {:?}.", _0)]
    InvalidPath(String),
    #[display(fmt = "Please enter a commit message.")]
    EmptyMessage,

    #[display(fmt = "No changes added to the commit.")]
    NothingToCommit,
    #[display(fmt = "No reason to remove the file.")]
    NothingToRemove(String),
    #[display(fmt = "A branch with that name already exists.")]
    BranchExists(String),
    #[display(fmt = "Cannot remove the current branch.")]
    RemoveActiveBranch(String),
    #[display(fmt = "No need to checkout the current branch.")]
    NoOpCheckout(String),
    #[display(fmt = "There is an untracked file in the way; delete it, or add and commit it first.")]
    UntrackedObstruction(Vec<String>),
    #[display(fmt = "You have uncommitted changes.")]
    UncommittedChanges,
    #[display(fmt = "Cannot merge a branch with itself.")]
    SelfMerge,
    #[display(fmt = "Given branch is an ancestor of the current branch.")]
    AlreadyAncestor,
}

/// The failure classes a caller can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A blob, commit, branch, or working-tree path does not exist.
    NotFound,
    /// An argument is semantically invalid.
    InvalidOperand,
    /// An operation-specific guard refused to run.
    PreconditionFailed,
    /// Persisted state contradicts itself.
    Corrupt,
    Io,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        use Error::*;
        match self {
            IO(_) => ErrorKind::Io,
            Serde(_) | MissingObject(_) | DanglingReference { .. } | Unrelated(..) => {
                ErrorKind::Corrupt
            }
            NotInitialized
            | NoSuchBranch(_)
            | NoSuchCheckoutBranch(_)
            | NoSuchCommit(_)
            | NoCommitWithMessage(_)
            | FileDoesNotExist(_)
            | PathNotInCommit(_) => ErrorKind::NotFound,
            AmbiguousCommit(_) | InvalidPath(_) | EmptyMessage => ErrorKind::InvalidOperand,
            AlreadyInitialized
            | NothingToCommit
            | NothingToRemove(_)
            | BranchExists(_)
            | RemoveActiveBranch(_)
            | NoOpCheckout(_)
            | UntrackedObstruction(_)
            | UncommittedChanges
            | SelfMerge
            | AlreadyAncestor => ErrorKind::PreconditionFailed,
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IO(err) => Some(err),
            Error::Serde(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Infallible> for Error {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
