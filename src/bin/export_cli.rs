use std::path::PathBuf;

use ff7_scene_tools_lib::export::wizard::{AutoPlacer, ExportWizard};
use ff7_scene_tools_lib::scene::{sections, DecodeOptions};

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 4 {
        eprintln!("Usage:");
        eprintln!("  export_cli <scene_file> <output_dir> <prefix> [--preview]");
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  export_cli ./STAGE00.BIN ./out st");
        eprintln!("  export_cli ./STAGE00.BIN ./out st --preview");
        std::process::exit(1);
    }

    let scene_path = PathBuf::from(&args[1]);
    let output_dir = PathBuf::from(&args[2]);
    let prefix = &args[3];
    let preview = args.iter().skip(4).any(|a| a == "--preview");

    let buffer = match std::fs::read(&scene_path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to read {}: {:?}", scene_path.display(), e);
            std::process::exit(1);
        }
    };

    eprintln!("Exporting scene '{}' ...", scene_path.display());
    eprintln!("  Output dir: {}", output_dir.display());
    eprintln!("  Prefix: {}", prefix);

    let scene = sections::decode(&buffer);
    for error in &scene.errors {
        eprintln!("  Decode error: {}", error);
    }

    let options = DecodeOptions::default();
    let wizard = ExportWizard::new(&scene, prefix, options);
    let files = match wizard.run(&mut AutoPlacer) {
        Ok(Some(files)) => files,
        Ok(None) => {
            eprintln!("Export cancelled");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Export failed: {:?}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = std::fs::create_dir_all(&output_dir) {
        eprintln!("Failed to create {}: {:?}", output_dir.display(), e);
        std::process::exit(1);
    }

    for file in &files {
        let path = output_dir.join(&file.name);
        if let Err(e) = std::fs::write(&path, &file.data) {
            eprintln!("Failed to write {}: {:?}", path.display(), e);
            std::process::exit(1);
        }
        eprintln!("  {} ({} bytes)", file.name, file.data.len());
    }
    eprintln!("Export complete! {} files", files.len());

    if preview {
        if let Some(texture) = &scene.texture {
            write_palette_previews(texture, &output_dir);
        } else {
            eprintln!("No texture section; skipping previews");
        }
    }
}

/// Dump one RGBA PNG per CLUT palette next to the exported files.
fn write_palette_previews(
    texture: &ff7_scene_tools_lib::scene::tim::TimTexture,
    output_dir: &std::path::Path,
) {
    let width = texture.image.width;
    let height = texture.image.height;

    for (palette, pixels) in texture.decode_all_palettes().into_iter().enumerate() {
        let Some(pixels) = pixels else {
            eprintln!("  Palette {}: not decodable, skipped", palette);
            continue;
        };
        let Some(img) = image::RgbaImage::from_raw(width, height, pixels) else {
            eprintln!("  Palette {}: unexpected pixel buffer size", palette);
            continue;
        };
        let path = output_dir.join(format!("preview_palette_{}.png", palette));
        match img.save(&path) {
            Ok(()) => eprintln!("  Preview: {}", path.display()),
            Err(e) => eprintln!("  Failed to write {}: {:?}", path.display(), e),
        }
    }
}
