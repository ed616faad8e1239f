pub mod fichaje_cutoff;
