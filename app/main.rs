use std::{
    env::current_dir,
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use revlet::{
    dot_rev::DotRev,
    merge::MergeOutcome,
    object_store::directory::DirectoryObjectStore,
    repository::Repository,
    Error,
};

#[derive(Parser, Debug)]
#[clap(name = "rev", about = "a small revision control system")]
struct Arguments {
    #[arg(long, global = true, help = "working tree to operate on [default: current directory]")]
    root: Option<PathBuf>,
    #[clap(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[clap(about = "initialize a brand new repository")]
    Init,
    #[clap(about = "stage a file for the next commit")]
    Add { path: String },
    #[clap(about = "record the staged changes")]
    Commit { message: String },
    #[clap(about = "unstage a file, staging its removal if it is tracked")]
    Rm { path: String },
    #[clap(about = "show the history of the current branch")]
    Log,
    #[clap(about = "show every commit ever made")]
    GlobalLog,
    #[clap(about = "print the ids of commits with the given message")]
    Find { message: String },
    #[clap(about = "restore a file, or switch branches")]
    Checkout {
        #[arg(help = "a branch, or the commit to restore a file from")]
        target: Option<String>,
        #[arg(last = true, help = "the file to restore")]
        path: Option<String>,
    },
    #[clap(about = "create a branch at the current commit")]
    Branch { name: String },
    #[clap(about = "delete a branch")]
    RmBranch { name: String },
    #[clap(about = "show branches, staged files, and working tree changes")]
    Status,
    #[clap(about = "move the current branch to a commit")]
    Reset { commit: String },
    #[clap(about = "merge a branch into the current branch")]
    Merge { branch: String },
}

/// Failures of the command line itself rather than of the repository.
#[derive(Debug, derive_more::Display, derive_more::From)]
enum CliError {
    #[display(fmt = "Incorrect operands.")]
    IncorrectOperands,
    #[from]
    #[display(fmt = "{}", _0)]
    Repository(Error),
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Arguments::parse();
    let root = match args.root {
        Some(root) => root,
        None => match current_dir() {
            Ok(dir) => dir,
            Err(err) => {
                eprintln!("cannot determine working directory: {}", err);
                return ExitCode::FAILURE;
            }
        },
    };
    match run(&root, args.cmd) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::debug!("command failed: {:?}", err);
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(root: &Path, cmd: Command) -> Result<(), CliError> {
    let dot_rev = match DotRev::existing(root) {
        Ok(dot_rev) => dot_rev,
        Err(Error::NotInitialized) if matches!(cmd, Command::Init) => {
            DotRev::init(root)?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };
    let mut repository = dot_rev.open()?;
    dispatch(&mut repository, cmd)?;
    dot_rev.save(&repository)?;
    Ok(())
}

fn dispatch(repository: &mut Repository<DirectoryObjectStore>, cmd: Command) -> Result<(), CliError> {
    use Command::*;
    match cmd {
        Init => return Err(Error::AlreadyInitialized.into()),
        Add { path } => {
            repository.add(&path)?;
        }
        Commit { message } => {
            repository.commit(&message)?;
        }
        Rm { path } => repository.rm(&path)?,
        Log => print_entries(repository.log()?),
        GlobalLog => print_entries(repository.global_log()?),
        Find { message } => {
            for id in repository.find(&message)? {
                println!("{}", id);
            }
        }
        Checkout { target, path } => match (target, path) {
            (None, Some(path)) => repository.checkout_path(&path)?,
            (Some(commit), Some(path)) => repository.checkout_path_at(&commit, &path)?,
            (Some(branch), None) => repository.checkout_branch(&branch)?,
            (None, None) => return Err(CliError::IncorrectOperands),
        },
        Branch { name } => repository.branch(&name)?,
        RmBranch { name } => repository.rm_branch(&name)?,
        Status => print!("{}", repository.status()?),
        Reset { commit } => {
            repository.reset(&commit)?;
        }
        Merge { branch } => match repository.merge(&branch)? {
            MergeOutcome::FastForwarded(_) => println!("Current branch fast-forwarded."),
            MergeOutcome::Merged { conflicts, .. } => {
                if !conflicts.is_empty() {
                    println!("Encountered a merge conflict.");
                }
            }
        },
    }
    Ok(())
}

fn print_entries(entries: Vec<revlet::report::LogEntry>) {
    let rendered: Vec<String> = entries.iter().map(ToString::to_string).collect();
    print!("{}", rendered.join("\n"));
}
