//! Variable names understood by the resolver.

pub const FC: &str = "FC";
pub const LD: &str = "LD";
pub const AR: &str = "AR";
pub const RANLIB: &str = "RANLIB";
pub const CPP: &str = "CPP";
pub const CPP_DEFS: &str = "CPP_DEFS";
pub const OPT: &str = "OPT";
pub const OPT_LNK: &str = "OPT_LNK";
pub const LINK_LIBS: &str = "LINK_LIBS";
pub const AR_SPEC: &str = "AR_SPEC";
pub const RAN_SPEC: &str = "RAN_SPEC";
pub const MODULEOPT: &str = "MODULEOPT";
pub const MPI_INC: &str = "MPI_INC";
pub const OBJ_MPI: &str = "OBJ_MPI";
pub const NC_LIB: &str = "NC_LIB";
pub const NC_INC: &str = "NC_INC";

/// All recognized keys, in the order a canonical arch file lists them.
pub const RECOGNIZED: &[&str] = &[
    FC, LD, AR, RANLIB, CPP, CPP_DEFS, OPT, OPT_LNK, LINK_LIBS, AR_SPEC, RAN_SPEC, MODULEOPT,
    MPI_INC, OBJ_MPI, NC_LIB, NC_INC,
];

pub fn is_recognized(name: &str) -> bool {
    RECOGNIZED.contains(&name)
}
