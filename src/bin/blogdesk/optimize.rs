use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use blogdesk::image_optimizer::ImageInput;

use crate::App;

#[derive(Args, Debug)]
pub(crate) struct ImageArgs {
    /// Image file to optimize
    input: PathBuf,

    /// Where the JPEG is written. Defaults to the input name with a .jpg extension
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the data URI instead of writing a file
    #[arg(long, conflicts_with = "output")]
    data_uri: bool,
}

pub(crate) fn image_cmd(app: &App, args: ImageArgs) -> Result<()> {
    let bytes = fs::read(&args.input)
        .with_context(|| format!("Error reading {}", args.input.display()))?;
    let original_size = bytes.len();

    let optimizer = app.composer.optimizer();
    let image = optimizer.optimize(ImageInput::Bytes(bytes))?;

    if args.data_uri {
        println!("{}", image.to_data_uri());
        return Ok(());
    }

    let output = args.output.unwrap_or_else(|| args.input.with_extension("jpg"));
    fs::write(&output, &image.bytes)
        .with_context(|| format!("Error writing {}", output.display()))?;

    let max_bytes = optimizer.config().max_bytes;
    println!("{} -> {}", args.input.display(), output.display());
    println!("{}x{}, quality {:.1}, {} -> {} bytes{}",
             image.width,
             image.height,
             image.quality(),
             original_size,
             image.size(),
             if image.within_budget(max_bytes) { "" } else { " (over budget, quality floor reached)" });
    Ok(())
}
