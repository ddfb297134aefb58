use anyhow::{bail, Context, Result};
use hgeo_core::codec::{read_geo, write_geo, EncodeOptions};
use hgeo_core::{AttributeOwner, GeoContainer};
use std::path::Path;

const USAGE: &str = "\
Usage:
  hgeo info <file.geo>
  hgeo rewrite <in.geo> <out.geo> [--pretty]";

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("info") => {
            let [_, path] = args.as_slice() else {
                bail!("{}", USAGE);
            };
            info(Path::new(path))
        }
        Some("rewrite") => {
            let (input, output, pretty) = match args.as_slice() {
                [_, input, output] => (input, output, false),
                [_, input, output, flag] if flag == "--pretty" => (input, output, true),
                _ => bail!("{}", USAGE),
            };
            rewrite(Path::new(input), Path::new(output), pretty)
        }
        _ => bail!("{}", USAGE),
    }
}

fn info(path: &Path) -> Result<()> {
    let geo = read_geo(path).with_context(|| format!("Failed to read {}", path.display()))?;

    println!("{}", path.display());
    println!(
        "  {} points, {} vertices, {} primitives",
        geo.point_count(),
        geo.vertex_count(),
        geo.prim_count()
    );

    print_attributes(&geo);
    print_primitives(&geo);

    for group in geo.point_groups() {
        println!("  point group '{}': {} points", group.name, group.len());
    }
    for group in geo.primitive_groups() {
        println!("  primitive group '{}': {} primitives", group.name, group.len());
    }

    let mesh = geo.to_mesh();
    if mesh.triangle_count() > 0 {
        println!(
            "  mesh: {} triangles, center {:?}, size {:.3}",
            mesh.triangle_count(),
            mesh.center(),
            mesh.size()
        );
    }

    Ok(())
}

fn print_attributes(geo: &GeoContainer) {
    for owner in AttributeOwner::ALL {
        for attribute in geo.attributes_of(owner) {
            println!(
                "  {} attribute '{}': {}[{}]",
                owner,
                attribute.name(),
                attribute.attribute_type(),
                attribute.tuple_size()
            );
        }
    }
}

fn print_primitives(geo: &GeoContainer) {
    let polygons = geo.poly_primitives().count();
    let curves = geo.nurb_curve_primitives().count();
    if polygons > 0 {
        println!("  {} polygons", polygons);
    }
    if curves > 0 {
        let closed = geo.nurb_curve_primitives().filter(|c| c.closed).count();
        println!("  {} NURBS curves ({} closed)", curves, closed);
    }
}

fn rewrite(input: &Path, output: &Path, pretty: bool) -> Result<()> {
    let geo = read_geo(input).with_context(|| format!("Failed to read {}", input.display()))?;
    let options = EncodeOptions::default().with_pretty(pretty);
    write_geo(output, &geo, &options)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}
