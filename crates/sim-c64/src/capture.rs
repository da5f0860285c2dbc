//! Headless capture: PNG screenshots and WAV audio dumps.

#![allow(clippy::cast_possible_truncation)]

use std::error::Error;
use std::fs;
use std::path::Path;

use sim_core::Framebuffer;

/// Sample rate of the bench's audio tap (8 MHz pixel clock / 160).
pub const AUDIO_SAMPLE_RATE: u32 = 50_000;

/// Save a framebuffer as a PNG file.
///
/// The framebuffer stores RGB triples; the encoder gets RGBA with an
/// opaque alpha channel.
pub fn save_screenshot(fb: &Framebuffer, path: &Path) -> Result<(), Box<dyn Error>> {
    let file = fs::File::create(path)?;
    let w = std::io::BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, fb.width(), fb.height());
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;

    let mut rgba = Vec::with_capacity((fb.width() * fb.height() * 4) as usize);
    for &[r, g, b] in fb.pixels() {
        rgba.push(r);
        rgba.push(g);
        rgba.push(b);
        rgba.push(0xFF);
    }

    writer.write_image_data(&rgba)?;
    Ok(())
}

/// Save audio samples as a WAV file (mono, 50 kHz, 16-bit PCM).
pub fn save_audio(samples: &[i16], path: &Path) -> Result<(), Box<dyn Error>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: AUDIO_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn temp_path(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("sim-c64-capture-{}-{name}", std::process::id()))
    }

    #[test]
    fn screenshot_roundtrips_through_png() {
        let mut fb = Framebuffer::new(4, 2);
        fb.put(0, 0, [0xFF, 0x00, 0x00]);
        fb.put(3, 1, [0x00, 0x00, 0xFF]);

        let path = temp_path("frame.png");
        save_screenshot(&fb, &path).expect("png written");

        let decoder = png::Decoder::new(fs::File::open(&path).expect("file exists"));
        let mut reader = decoder.read_info().expect("valid png");
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf).expect("frame decoded");
        assert_eq!((info.width, info.height), (4, 2));
        assert_eq!(&buf[0..4], &[0xFF, 0x00, 0x00, 0xFF]);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn audio_written_with_bench_sample_rate() {
        let path = temp_path("audio.wav");
        save_audio(&[0, 1000, -1000, i16::MAX], &path).expect("wav written");

        let reader = hound::WavReader::open(&path).expect("valid wav");
        assert_eq!(reader.spec().sample_rate, AUDIO_SAMPLE_RATE);
        assert_eq!(reader.len(), 4);

        fs::remove_file(&path).ok();
    }
}
