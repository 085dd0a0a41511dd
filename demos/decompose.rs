use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use clap::Parser;
use log::{info, LevelFilter};
use rayon::prelude::*;
use simple_logger::SimpleLogger;
use gridbox::{io, ops, BoxArray, IndexBox, IntVect};




/**
 * Decompose a square domain into blocks, find the ghost-zone neighbors of
 * every block, and optionally write the decomposition to a checkpoint.
 */
#[derive(Debug, Parser)]
#[clap(version = "0.1", author = "J. Zrake <jzrake@clemson.edu>")]
struct Opts {
    #[clap(short = 'n', long, default_value = "1024")]
    domain_size: i64,

    #[clap(short = 'b', long, default_value = "32")]
    block_size: i64,

    #[clap(short = 'g', long, default_value = "2")]
    num_guard: i64,

    #[clap(short = 't', long, default_value = "1")]
    num_threads: usize,

    #[clap(short = 'l', long, default_value = "info")]
    log_level: LevelFilter,

    /// Write the decomposition here; `.cbor` files are binary, anything
    /// else is text
    #[clap(short = 'o', long)]
    output: Option<String>,
}




// ============================================================================
fn main() -> Result<(), Box<dyn Error>> {
    let opts = Opts::parse();

    SimpleLogger::new().with_level(opts.log_level).init()?;
    rayon::ThreadPoolBuilder::new().num_threads(opts.num_threads).build_global()?;
    info!("{:?}", opts);

    let n = opts.domain_size;
    let domain = IndexBox::new([0, 0], [n - 1, n - 1]);
    let mut level = BoxArray::from_box(domain);
    level.max_size(IntVect::splat(opts.block_size))?;

    info!("{} blocks of at most {} cells", level.len()?, opts.block_size.pow(2));

    let start = std::time::Instant::now();
    let ng = IntVect::splat(opts.num_guard);
    let blocks: Vec<_> = level.iter()?.collect();

    let neighbors = blocks
        .par_iter()
        .enumerate()
        .map(|(i, b)| {
            level
                .intersections(&b.grow(ng), false, IntVect::zero())
                .map(|hits| hits.into_iter().filter(|(j, _)| *j != i).count())
        })
        .collect::<gridbox::Result<Vec<_>>>()?;

    let total: usize = neighbors.iter().sum();
    info!(
        "found {} ghost-zone neighbors ({:.2} per block) in {:.3}s",
        total,
        total as f64 / blocks.len() as f64,
        start.elapsed().as_secs_f64());

    let ghosts = ops::bndry_cells(&level, opts.num_guard)?;
    info!("{} ghost cells outside the domain", ghosts.num_pts());

    let coarse = level.coarsened(IntVect::splat(2))?;
    info!(
        "coarsened view shares the store: {} (minimal box {})",
        BoxArray::same_refs(&level, &coarse),
        coarse.minimal_box()?);

    if let Some(output) = opts.output {
        let writer = BufWriter::new(File::create(&output)?);

        if output.ends_with(".cbor") {
            io::write_cbor(&level, writer)?;
        } else {
            io::write_box_array(&level, writer)?;
        }
        info!("wrote {}", output);
    }
    Ok(())
}
