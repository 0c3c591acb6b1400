mod cli;

use anyhow::Context;
use tfsynth::manifest::Manifest;
use tfsynth::App;

fn main() {
    use clap::Parser;
    let cli = cli::Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("TFSYNTH_LOG"))
        .with_writer(std::io::stderr)
        .init();

    for new_path in cli.directory.iter() {
        match new_path.canonicalize() {
            Err(e) => {
                eprintln!(
                    "Failed to resolve path for -C/--directory {}\n{}",
                    new_path.display(),
                    e
                );
                std::process::exit(1);
            }
            Ok(cwd) => {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    eprintln!("Failed to set work directory to {}\n{}", cwd.display(), err,);
                    std::process::exit(1);
                }

                tracing::info!(directory=%cwd.display(), "Changed working directory");
            }
        }
    }

    let command_result = match cli.command {
        cli::Command::Synth(synth_cli) => synth(synth_cli),
        cli::Command::Validate(validate_cli) => validate(validate_cli),
        cli::Command::Dev(dev_cli) => dev(dev_cli),
    };

    if let Err(e) = command_result {
        for error in e.chain() {
            eprintln!("{error}")
        }
        std::process::exit(1);
    }
}

pub fn synth(cli: cli::SynthCommand) -> anyhow::Result<()> {
    let app = load(&cli.input)?.build()?;

    let stacks = match &cli.stack {
        Some(name) => {
            let stack = app
                .stacks()
                .find(|stack| app.path(*stack) == Some(name.as_str()));
            vec![stack.ok_or_else(|| anyhow::anyhow!("No stack named '{name}'"))?]
        }
        None => app.stacks().collect(),
    };
    anyhow::ensure!(!stacks.is_empty(), "No stacks defined");

    let mut documents = serde_json::Map::new();
    for stack in stacks {
        let name = app.path(stack).unwrap_or_default().to_string();
        let document = app
            .synth(stack)
            .with_context(|| format!("Failed to synthesize stack '{name}'"))?;
        documents.insert(name, serde_json::to_value(&document)?);
    }

    // a single stack is printed as is, several are keyed by stack name
    let value = match (cli.stack.is_some(), documents.len()) {
        (true, _) | (_, 1) => documents
            .into_iter()
            .next()
            .map(|(_, document)| document)
            .unwrap_or_default(),
        _ => serde_json::Value::Object(documents),
    };

    output(&cli.output, &value)
}

pub fn validate(cli: cli::ValidateCommand) -> anyhow::Result<()> {
    let app = load(&cli.input)?.build()?;

    let diagnostics = app.validate(app.root());
    for diagnostic in &diagnostics {
        println!("{diagnostic}");
    }

    anyhow::ensure!(
        diagnostics.is_empty(),
        "Validation found {} issue(s)",
        diagnostics.len()
    );
    Ok(())
}

fn load(input: &cli::InputArgs) -> anyhow::Result<Manifest> {
    if !input.workdir && input.files.is_empty() && input.directories.is_empty() {
        let stdin = std::io::read_to_string(std::io::stdin())?;
        let body = hcl_edit::parser::parse_body(&stdin)?;
        return Ok(body.into());
    }

    let mut manifest = Manifest::default();

    if input.workdir {
        manifest.load_directory(&std::env::current_dir()?)?;
    }

    for file_path in &input.files {
        manifest.load_file(file_path)?;
    }

    for dir_path in &input.directories {
        manifest.load_directory(dir_path)?;
    }

    anyhow::ensure!(manifest.source_count() > 0, "No files loaded");

    Ok(manifest)
}

fn output(output: &cli::OutputArgs, value: &serde_json::Value) -> anyhow::Result<()> {
    match output.format {
        cli::OutputFormat::Yaml => serde_yaml::to_writer(std::io::stdout(), value)?,
        cli::OutputFormat::Json => serde_json::to_writer_pretty(std::io::stdout(), value)?,
    };

    Ok(())
}

/// developer utilities
///
/// A quick way to expose internal structures for debugging purposes
pub fn dev(cli: cli::DevCommand) -> anyhow::Result<()> {
    let manifest = load(&cli.input)?;

    match cli.command {
        cli::DevSubCommand::Manifest => println!("{manifest:#?}"),
        cli::DevSubCommand::Tree => print_tree(&manifest.build()?),
    }

    Ok(())
}

fn print_tree(app: &App) {
    let tree = app.tree();
    for id in tree.traverse(app.root()) {
        let node = &tree[id];
        let depth = tree.ancestors(id).count();
        let logical_id = app.logical_id(id).unwrap_or_default();
        println!(
            "{:indent$}{} [{}] {}",
            "",
            node.local_id(),
            node.data.construct.kind(),
            logical_id,
            indent = depth * 2
        );
    }
}
