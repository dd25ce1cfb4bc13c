use clap::Parser;
use proteus_processor::cli::{args::Args, commands};
use std::process;

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    match commands::run(args) {
        Ok(()) => {
            process::exit(0);
        }
        Err(error) => {
            // Error occurred - print to stderr and exit with error code
            eprintln!("Error: {}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("ProteusDS Result Processor");
    println!("==========================");
    println!();
    println!("Decode fixed-format ProteusDS simulation output files and aggregate");
    println!("results across the Cases and Realizations of a study.");
    println!();
    println!("USAGE:");
    println!("    proteus-processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    decode         Decode a single results file and preview it");
    println!("    connections    List the connection names embedded in a connection file");
    println!("    aggregate      Aggregate one results file across all Cases and Realizations");
    println!("    help           Show this help message or help for specific commands");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Show help information");
    println!("    -V, --version    Show version information");
    println!();
    println!("EXAMPLES:");
    println!("    # Preview a tensions file with overlays for one channel:");
    println!("    proteus-processor decode Results/M1/tensions.dat \\");
    println!("                             --stats min,max,mean --stats-column \"T_1 [N]\"");
    println!();
    println!("    # Decode one connection of a rigid body force connection file:");
    println!("    proteus-processor decode rigidBodyForceConnection.dat --connection M2");
    println!();
    println!("    # List the features of a study, then aggregate one file:");
    println!("    proteus-processor aggregate ~/Sim1_results");
    println!("    proteus-processor aggregate ~/Sim1_results --feature M1 \\");
    println!("                                --file tensions.dat --method extrema");
    println!();
    println!("For detailed help on any command, use:");
    println!("    proteus-processor <COMMAND> --help");
}
