pub mod fasta;
pub mod gff;
pub mod isomir_sea;
pub mod table;
