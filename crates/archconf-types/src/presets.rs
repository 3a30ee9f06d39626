//! Arch files shipped with the tool.

#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub name: &'static str,
    pub description: &'static str,
    pub source: &'static str,
}

pub const PRESETS: &[Preset] = &[
    Preset {
        name: "linux_intel",
        description: "Linux, Intel ifx with OpenMPI (mpiifx wrapper)",
        source: include_str!("../presets/linux_intel.h"),
    },
    Preset {
        name: "linux_gfortran",
        description: "Linux, gfortran, serial build with the MPI stub",
        source: include_str!("../presets/linux_gfortran.h"),
    },
    Preset {
        name: "linux_gfortran_openmpi",
        description: "Linux, gfortran with OpenMPI (mpif90 wrapper)",
        source: include_str!("../presets/linux_gfortran_openmpi.h"),
    },
];

pub fn find(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.name == name)
}
