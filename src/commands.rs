use std::path::{Path, PathBuf};

use log::info;

use crate::media::{Media, Persist};
use crate::result::Result;
use crate::secret::Secret;

/// Hide `secret_file` inside `carrier_file` and write the stego carrier to
/// `output_file`. The carrier on disk is never modified.
pub fn conceal(secret_file: &Path, carrier_file: &Path, output_file: &Path) -> Result<()> {
    let secret = Secret::from_file(secret_file)?;
    let mut media = Media::from_file(carrier_file)?;

    media.conceal(&secret)?;
    media.save_as(output_file)?;
    info!("concealed {secret_file:?} in {carrier_file:?} as {output_file:?}");

    Ok(())
}

/// Extract the secret hidden in `carrier_file` and write it next to
/// `output_base`, with the extension recorded in the embedded header.
/// Returns the path of the recovered file.
pub fn reveal(carrier_file: &Path, output_base: &Path) -> Result<PathBuf> {
    let media = Media::from_file(carrier_file)?;
    let secret = media.reveal()?;

    let written = secret.write_to(output_base)?;
    info!("revealed {written:?} from {carrier_file:?}");

    Ok(written)
}
