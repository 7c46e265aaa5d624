//! Manifest writer.
//!
//! Each region becomes one block of the form:
//!
//! ```text
//! region_<offset> {
//! 	/* <section names> */
//! 	load-address-relative-offset = <0x<hi> 0x<lo>>;	/* 0x<start> - 0x<end> */
//! 	pages-count = <N>;	/* <bytes> bytes */
//! 	attributes = <N>;	/* <attribute names> */
//! 	load-flags = <N>;	/* <load flag names> */
//! };
//! ```
//!
//! All addresses are relative to the load base address of the image.

use std::fmt::{self, Write};

use crate::region::Region;
use crate::segment::Segment;
use crate::utils::pages_count;

/// Writes the blocks of every region of every segment, in order.
pub fn write_segments<W: Write>(out: &mut W, segments: &[Segment], load_base_addr: u64) -> fmt::Result {
    for segment in segments {
        tracing::trace!(
            "Writing segment {}: {} regions{}",
            segment.index,
            segment.regions.len(),
            if segment.bti { " (BTI)" } else { "" }
        );
        for region in &segment.regions {
            write_region(out, region, load_base_addr)?;
        }
    }
    Ok(())
}

/// Writes the manifest block of a single region.
pub fn write_region<W: Write>(out: &mut W, region: &Region, load_base_addr: u64) -> fmt::Result {
    let base = region.start_address - load_base_addr;
    let end = region.end_address - load_base_addr;
    let high = (base >> 32) & 0xffff_ffff;
    let low = base & 0xffff_ffff;
    let len = region.len();

    writeln!(out, "region_{:x} {{", base)?;
    writeln!(out, "\t/* {} */", region.sections.join(", "))?;
    writeln!(
        out,
        "\tload-address-relative-offset = <0x{:x} 0x{:x}>;\t/* 0x{:x} - 0x{:x} */",
        high, low, base, end
    )?;
    writeln!(out, "\tpages-count = <{}>;\t/* {} bytes */", pages_count(len), len)?;
    writeln!(
        out,
        "\tattributes = <{}>;\t/* {} */",
        region.attributes.bits(),
        region.attributes
    )?;
    writeln!(
        out,
        "\tload-flags = <{}>;\t/* {} */",
        region.load_flags.bits(),
        region.load_flags
    )?;
    writeln!(out, "}};")
}
