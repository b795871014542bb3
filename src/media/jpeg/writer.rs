//! Reassembles a complete JPEG file from parsed segments and replacement
//! scan data. Every original segment is copied through verbatim; only the
//! SOS header is reconstructed and the scan swapped.

use super::marker::Marker;
use super::segments::JpegFile;

pub fn write_jpeg(jpeg: &JpegFile, scan_data: &[u8]) -> Vec<u8> {
    let estimated = jpeg
        .segments
        .iter()
        .map(|s| s.data.len() + 4)
        .sum::<usize>()
        + scan_data.len()
        + 64;
    let mut output = Vec::with_capacity(estimated);

    push_marker(&mut output, Marker::Soi);

    for segment in &jpeg.segments {
        push_marker(&mut output, segment.marker);
        if segment.marker.has_length() {
            let length = (segment.data.len() + 2) as u16;
            output.extend_from_slice(&length.to_be_bytes());
        }
        output.extend_from_slice(&segment.data);
    }

    push_sos_header(&mut output, jpeg);
    output.extend_from_slice(scan_data);

    push_marker(&mut output, Marker::Eoi);
    output
}

fn push_marker(output: &mut Vec<u8>, marker: Marker) {
    output.push(0xFF);
    output.push(marker.to_u8());
}

/// Rebuild the SOS header from the frame's table assignments, with the
/// baseline spectral selection parameters (Ss=0, Se=63, Ah=Al=0).
fn push_sos_header(output: &mut Vec<u8>, jpeg: &JpegFile) {
    let frame = match &jpeg.frame {
        Some(f) => f,
        None => return,
    };

    push_marker(output, Marker::Sos);

    let num_components = frame.components.len() as u8;
    let length = 6 + 2 * u16::from(num_components);
    output.extend_from_slice(&length.to_be_bytes());

    output.push(num_components);
    for component in &frame.components {
        output.push(component.id);
        output.push((component.dc_table_id << 4) | component.ac_table_id);
    }

    output.push(0);
    output.push(63);
    output.push(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::jpeg::{decode_scan, encode_scan, parse_jpeg};

    fn sample_jpeg() -> Vec<u8> {
        let mut rng = fastrand::Rng::with_seed(11);
        let img = image::RgbImage::from_fn(48, 48, |_, _| {
            image::Rgb([rng.u8(..), rng.u8(..), rng.u8(..)])
        });
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Jpeg)
            .expect("jpeg encode");
        bytes.into_inner()
    }

    #[test]
    fn rewritten_file_parses_to_the_same_coefficients() {
        let original = sample_jpeg();
        let jpeg = parse_jpeg(&original).unwrap();
        let coefficients = decode_scan(&jpeg).unwrap();

        let scan = encode_scan(&coefficients, &jpeg).unwrap();
        let rewritten = write_jpeg(&jpeg, &scan);

        assert!(rewritten.starts_with(&[0xFF, 0xD8]));
        assert!(rewritten.ends_with(&[0xFF, 0xD9]));

        let reparsed = parse_jpeg(&rewritten).unwrap();
        let redecoded = decode_scan(&reparsed).unwrap();
        assert_eq!(redecoded, coefficients);
    }

    #[test]
    fn rewritten_file_is_decodable_by_a_foreign_decoder() {
        let original = sample_jpeg();
        let jpeg = parse_jpeg(&original).unwrap();
        let coefficients = decode_scan(&jpeg).unwrap();
        let rewritten = write_jpeg(&jpeg, &encode_scan(&coefficients, &jpeg).unwrap());

        let decoded = image::load_from_memory_with_format(&rewritten, image::ImageFormat::Jpeg)
            .expect("foreign decode");
        assert_eq!(decoded.width(), 48);
        assert_eq!(decoded.height(), 48);
    }
}
