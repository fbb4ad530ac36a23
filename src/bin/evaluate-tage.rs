
use geotage::*;
use geotage::stats::*;
use std::env;
use std::error::Error;
use std::time::Instant;

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        println!("usage: {} <trace file> [config.json]", args[0]);
        return Ok(());
    }

    let cfg = match args.get(2) {
        Some(path) => TAGEConfig::from_json_file(path)?,
        None => TAGEConfig::default(),
    };

    let trace = BinaryTrace::from_file(&args[1])?;
    let trace_records = trace.as_slice();
    println!("[*] Loaded {} records from {}", trace.num_entries(), trace.name());

    let mut module = TAGEModule::new(cfg.build()?);
    let cfg = &module.tage.cfg;
    println!("[*] TAGE configuration:");
    println!("      Entries (in total): {}", cfg.total_entries());
    println!("        {} entries (base component)", cfg.bimodal_size);
    for c in cfg.component_configs() {
        println!("        {} entries (tagged component {}, {} history bits, {}-bit tags)",
            c.size(), c.number, c.history_length, c.tag_bits
        );
    }
    let storage_bits = cfg.storage_bits();
    let storage_kib = storage_bits as f64 / 1024.0 / 8.0;
    println!("      Storage bits: {}b, {:.2}KiB", storage_bits, storage_kib);
    println!("      Global history register: {} bits", cfg.global_history_bits);

    let mut stats = BranchStats::new();
    let start = Instant::now();
    for record in trace_records {
        let predicted = module.predict_branch(record.pc);
        if record.is_conditional() {
            stats.update(record, Outcome::from_bool(predicted));
        }
        module.last_branch_result(
            record.pc, record.tgt, record.outcome.is_taken(), record.kind
        );
    }
    let done = start.elapsed();
    println!("[*] ... simulated in {:.3?}", done);
    println!();

    println!("[*] Global statistics:");
    println!("      Unique branches: {}", stats.num_unique_branches());
    println!("      Global hit rate: {}/{} ({:.2}% correct) ({} misses)",
        stats.global_hits, stats.global_brns, stats.hit_rate() * 100.0,
        stats.global_miss()
    );
    println!("      MPKB:            {:.2} miss/kbrn", stats.mpkb());
    println!();

    println!("[*] Per-component statistics:");
    println!("{}", module.tage.stat);
    for comp in module.tage.comp.iter() {
        println!("      Component[{:2}] ({:3} history bits): {:.2}% utilization, {} useful entries",
            comp.number(), comp.history_length(), comp.utilization(),
            comp.num_useful_entries()
        );
    }
    println!();

    println!("[*] Low hit-rate branches:");
    for (pc, data) in stats.get_low_rate_branches(8, 100) {
        println!("  {:016x} {:8}/{:8} {:.4} ({} taken)",
            pc, data.hits, data.occ, data.hit_rate(), data.times_taken()
        );
    }
    Ok(())
}
