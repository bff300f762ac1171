use clap::Parser;
use kubetype_codegen::cli::CodegenArgs;
use kubetype_codegen::codegen::RustEmitter;
use kubetype_codegen::declarations::ModuleSet;
use kubetype_codegen::fetch::sources::LocalDirectory;
use kubetype_codegen::fetch::{Kustomize, compile_location, report_unresolved};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> miette::Result<()> {
    let args = CodegenArgs::parse();
    init_tracing(args.verbose);

    tracing::info!(input = %args.input.display(), "loading schemas");
    let source = LocalDirectory::new(&args.input);
    let expander = Kustomize::new(args.expander);
    let location = args.input.to_string_lossy();

    let mut modules = ModuleSet::new();
    compile_location(&source, &expander, &location, &mut modules).await?;
    report_unresolved(&modules);

    let emitter = RustEmitter::new(&modules, &args.root_module)?;
    emitter.write_to_disk(&args.output)?;

    println!("Generated code to {:?}", args.output);

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("KUBETYPE_LOG").unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}
