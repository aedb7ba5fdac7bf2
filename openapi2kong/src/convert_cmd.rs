use std::fs;
use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use openapi2kong::summary::{render, summarize};
use openapi2kong::{convert, load_options, ConversionOptions};
use tracing::{debug, info, info_span};
use yaml_tree_core::{write, Format};

use crate::cli::{ConvertArgs, OutputFormat};
use crate::path_guard::ensure_output_not_same;

/// Run `openapi2kong convert`.
///
/// Options come from `--options-file` first; flags then override them, with
/// `--select-tag` values appended after the file's tags.
pub fn run_convert(args: ConvertArgs) -> Result<()> {
    if !args.reads_stdin() && !args.writes_stdout() {
        ensure_output_not_same(&args.output_file, &args.spec)?;
    }

    let options = resolve_options(&args)?;
    debug!(?options, "resolved conversion options");

    let input = {
        let _span = info_span!("read", spec = %args.spec.display()).entered();
        read_spec(&args)?
    };
    info!(bytes = input.len(), "read spec");

    let config = {
        let _span = info_span!("convert").entered();
        convert(&input, &options)
            .with_context(|| format!("failed to convert {}", args.spec.display()))?
    };
    let summary = summarize(&config);
    info!(
        services = summary.services,
        routes = summary.routes,
        plugins = summary.plugins,
        upstreams = summary.upstreams,
        "converted"
    );

    {
        let _span = info_span!("write", output = %args.output_file.display()).entered();
        let format = match args.format {
            OutputFormat::Yaml => Format::Yaml,
            OutputFormat::Json => Format::Json,
        };
        let bytes = write(&config, format).context("failed to encode Kong config")?;
        if args.writes_stdout() {
            io::stdout()
                .lock()
                .write_all(&bytes)
                .context("failed to write Kong config to stdout")?;
        } else {
            fs::write(&args.output_file, bytes).with_context(|| {
                format!("failed to write output {}", args.output_file.display())
            })?;
        }
    }

    if !args.quiet {
        eprintln!("{}", render(summary));
    }
    Ok(())
}

fn resolve_options(args: &ConvertArgs) -> Result<ConversionOptions> {
    let mut options = match &args.options_file {
        Some(path) => load_options(path)?,
        None => ConversionOptions::default(),
    };
    options.tags.extend(args.select_tags.iter().cloned());
    if args.validator {
        options.generate_validator = true;
    }
    if let Some(name) = &args.doc_name {
        options.doc_name = Some(name.clone());
    }
    Ok(options)
}

fn read_spec(args: &ConvertArgs) -> Result<Vec<u8>> {
    if args.reads_stdin() {
        let mut input = Vec::new();
        io::stdin()
            .lock()
            .read_to_end(&mut input)
            .context("failed to read spec from stdin")?;
        return Ok(input);
    }
    fs::read(&args.spec).with_context(|| format!("failed to read spec {}", args.spec.display()))
}
