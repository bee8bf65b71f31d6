//! zapfs shell - interactive front end for pseudo-FAT volume images
//!
//! Reads one command per line from stdin and executes it against the volume.
//! Mutating commands answer `OK` on stdout; failures print `ERROR: <cause>`
//! on stderr and the loop continues.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use zapfs_core::{parse_size_spec, Error};
use zapfs_volume::Volume;

const RULER: &str =
    "-------------------------------------------------------------------------------";

#[derive(Parser)]
#[command(name = "zapfs")]
#[command(about = "Shell for a pseudo-FAT volume stored in a single file")]
#[command(version)]
struct Cli {
    /// Path to the volume image file (created empty when absent)
    image: PathBuf,

    /// Log level
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(&cli.log_level)
        .init();

    let mut volume = Volume::open(&cli.image)?;
    tracing::debug!(
        image = %cli.image.display(),
        formatted = volume.is_formatted(),
        "volume opened"
    );

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        if tokens[0] == "exit" {
            break;
        }
        execute(&mut volume, &tokens);
    }

    Ok(())
}

/// Run one tokenized command, printing its outcome
fn execute(volume: &mut Volume, tokens: &[&str]) {
    let command = tokens[0];
    let args = &tokens[1..];

    let outcome = match command {
        "help" => {
            print_help();
            Ok(false)
        }
        "meta" => cmd_meta(volume),
        "fat" => cmd_fat(volume),
        "pwd" => {
            println!("{}", volume.working_path());
            Ok(false)
        }
        "ls" => cmd_ls(volume, args.first().copied()),
        "cat" => with_arg(args, "cat <file>", |path| cmd_cat(volume, path)),
        "info" => with_arg(args, "info <dir/file>", |path| cmd_info(volume, path)),
        "cd" => volume.change_dir(args.first().copied()).map(|_| true),
        "mkdir" => with_arg(args, "mkdir <dir>", |path| {
            volume.mkdir(path).map(|_| true)
        }),
        "rmdir" => with_arg(args, "rmdir <dir>", |path| {
            volume.rmdir(path).map(|_| true)
        }),
        "rm" => with_arg(args, "rm <file>", |path| {
            volume.remove_file(path).map(|_| true)
        }),
        "incp" => with_two_args(args, "incp <src> <dst>", |src, dst| {
            volume.import(Path::new(src), dst).map(|_| true)
        }),
        "outcp" => with_two_args(args, "outcp <src> <dst>", |src, dst| {
            volume.export(src, Path::new(dst)).map(|_| true)
        }),
        "cp" => with_two_args(args, "cp <src> <dst>", |src, dst| {
            volume.copy(src, dst).map(|_| true)
        }),
        "mv" => with_two_args(args, "mv <src> <dst>", |src, dst| {
            volume.rename(src, dst).map(|_| true)
        }),
        "defrag" => with_arg(args, "defrag <file>", |path| volume.defrag(path)),
        "format" => cmd_format(volume, args),
        "load" => with_arg(args, "load <file>", |path| cmd_load(volume, path)),
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("Type 'help' for a list of commands");
            return;
        }
    };

    match outcome {
        Ok(true) => println!("OK"),
        Ok(false) => {}
        Err(err) => eprintln!("ERROR: {}", err),
    }
}

/// Run a one-argument command, or print its usage line
fn with_arg<F>(args: &[&str], usage: &str, run: F) -> Result<bool, Error>
where
    F: FnOnce(&str) -> Result<bool, Error>,
{
    match args.first() {
        Some(arg) => run(arg),
        None => {
            eprintln!("Usage: {}", usage);
            Ok(false)
        }
    }
}

/// Run a two-argument command, or print its usage line
fn with_two_args<F>(args: &[&str], usage: &str, run: F) -> Result<bool, Error>
where
    F: FnOnce(&str, &str) -> Result<bool, Error>,
{
    match args {
        [src, dst, ..] => run(src, dst),
        _ => {
            eprintln!("Usage: {}", usage);
            Ok(false)
        }
    }
}

fn cmd_meta(volume: &mut Volume) -> Result<bool, Error> {
    let sb = *volume.superblock().ok_or(Error::NotFormatted)?;

    println!("{}", RULER);
    println!("Signature:          zapped99");
    println!("Disk size:          {}", sb.disk_size);
    println!("Cluster size:       {}", sb.cluster_size);
    println!("Cluster count:      {}", sb.cluster_count);
    println!("Fat start address:  {}", sb.fat_start_address);
    println!("Fat size:           {}", sb.fat_size());
    println!("Data start address: {}", sb.data_start_address);
    println!("{}", RULER);
    Ok(false)
}

fn cmd_fat(volume: &mut Volume) -> Result<bool, Error> {
    let table = volume.fat_table()?;

    println!("{}", RULER);
    for (index, cell) in table.iter().enumerate() {
        println!("{}: {}", index, cell);
    }
    println!("{}", RULER);
    Ok(false)
}

fn cmd_ls(volume: &mut Volume, path: Option<&str>) -> Result<bool, Error> {
    for info in volume.list(path)? {
        println!("{}", info);
    }
    Ok(false)
}

fn cmd_cat(volume: &mut Volume, path: &str) -> Result<bool, Error> {
    let data = volume.read_file(path)?;
    let mut stdout = io::stdout();
    stdout.write_all(&data)?;
    stdout.write_all(b"\n")?;
    stdout.flush()?;
    Ok(false)
}

fn cmd_info(volume: &mut Volume, path: &str) -> Result<bool, Error> {
    let report = volume.stat(path)?;

    println!("{}", RULER);
    println!("File name: {}", report.name);
    if report.is_directory {
        println!("Type: directory");
    } else {
        println!("Type: file");
    }
    println!("File size: {}B", report.size);
    println!("File start cluster address: {}", report.start_cluster);
    let clusters: Vec<String> = report.clusters.iter().map(u32::to_string).collect();
    println!("File clusters: {}", clusters.join(" "));
    println!("{}", RULER);
    Ok(false)
}

fn cmd_format(volume: &mut Volume, args: &[&str]) -> Result<bool, Error> {
    let Some(spec) = args.first() else {
        eprintln!("Usage: format <size>");
        return Ok(false);
    };
    let Some(size) = parse_size_spec(spec) else {
        eprintln!("Invalid size: {}", spec);
        return Ok(false);
    };

    volume.format(size)?;
    Ok(true)
}

/// Execute a command script from the host file system
///
/// Each line is echoed with the working directory, then run; failures do
/// not stop the batch.
fn cmd_load(volume: &mut Volume, path: &str) -> Result<bool, Error> {
    let file = File::open(path).map_err(|_| Error::PathNotFound)?;

    for line in BufReader::new(file).lines() {
        let line = line?;
        println!("{}$ >{}", volume.working_path(), line);

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            continue;
        }
        execute(volume, &tokens);
    }

    Ok(true)
}

fn print_help() {
    println!("{}", RULER);
    println!("| help              | display this message                                    |");
    println!("| exit              | exit the program                                        |");
    println!("| meta              | display meta information about the file system          |");
    println!("| fat               | display the FAT                                         |");
    println!("| cp <src> <dst>    | copy file from <src> to <dst>                           |");
    println!("| mv <src> <dst>    | move file from <src> to <dst>                           |");
    println!("| rm <file>         | remove file <file>                                      |");
    println!("| mkdir <dir>       | create directory <dir>                                  |");
    println!("| rmdir <dir>       | remove directory <dir>                                  |");
    println!("| ls <dir>          | list directory <dir> contents                           |");
    println!("| cat <file>        | display file <file> contents                            |");
    println!("| cd <dir>          | change current directory to <dir>                       |");
    println!("| pwd               | print working directory                                 |");
    println!("| info <dir/file>   | display information about directory <dir> / file <file> |");
    println!("| incp <src> <dst>  | copy file from disk <src> to <dst> in the file system   |");
    println!("| outcp <src> <dst> | copy file from <src> in the file system to disk <dst>   |");
    println!("| load <file>       | load file <file> from disk and execute commands from it |");
    println!("| format <size>     | format the file system with size <size>                 |");
    println!("| defrag <file>     | defragment the file <file>                              |");
    println!("{}", RULER);
}
