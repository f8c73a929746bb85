use std::path::PathBuf;

use ff7_scene_tools_lib::scene::classify;
use ff7_scene_tools_lib::scene::sections;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage:");
        eprintln!("  scene_inspect <scene_file> [--json]");
        std::process::exit(1);
    }

    let scene_path = PathBuf::from(&args[1]);
    let as_json = args.iter().skip(2).any(|a| a == "--json");

    let buffer = match std::fs::read(&scene_path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Failed to read {}: {:?}", scene_path.display(), e);
            std::process::exit(1);
        }
    };

    let scene = sections::decode(&buffer);

    if as_json {
        match serde_json::to_string_pretty(&scene) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Failed to serialize scene: {:?}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    eprintln!("Scene: {} ({} bytes)", scene_path.display(), buffer.len());
    for error in &scene.errors {
        eprintln!("  Decode error: {}", error);
    }

    if let Some(table) = &scene.table {
        println!("Sections: {}", table.section_count);
        for info in &scene.sections {
            println!(
                "  [{}] offset={:#x} size={} kind={:?}",
                info.index, info.offset, info.size, info.kind
            );
        }
    }

    if let Some(metadata) = &scene.metadata {
        println!(
            "Metadata: flags={:#x} reserved={:#x}",
            metadata.flags, metadata.reserved
        );
    }

    for (i, geom) in scene.meshes().iter().enumerate() {
        println!(
            "{}: {} vertices, {} triangles, {} quads, tpage {}",
            classify(i).display_name(),
            geom.vertices.len(),
            geom.triangles.len(),
            geom.quads.len(),
            geom.texture_page_x
        );
    }

    if let Some(tex) = &scene.texture {
        println!(
            "Texture: {}x{} {}bpp, {} palettes, VRAM page {}",
            tex.image.width,
            tex.image.height,
            tex.bpp,
            tex.palette_count(),
            tex.base_page_x()
        );
    } else {
        println!("Texture: none");
    }
}
