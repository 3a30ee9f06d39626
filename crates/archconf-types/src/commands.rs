//! Compiler, linker and archiver command lines from a resolved config.

use crate::config::BuildConfig;

impl BuildConfig {
    /// `FC OPT [MODULEOPT dir] CPP_DEFS [MPI_INC] [NC_INC] -c source -o object`
    pub fn compile_args(&self, source: &str, object: &str, module_dir: Option<&str>) -> Vec<String> {
        let mut argv = self.toolchain().compiler().argv();
        argv.extend(self.optimization().compile_flags().iter().cloned());
        if let Some(dir) = module_dir {
            argv.extend(self.module_output().args(dir));
        }
        argv.extend(self.defines().tokens());
        argv.extend(self.mpi().include_args().iter().cloned());
        if let Some(nc) = self.netcdf() {
            argv.extend(nc.include_args().iter().cloned());
        }
        argv.extend(["-c".to_string(), source.to_string()]);
        argv.extend(["-o".to_string(), object.to_string()]);
        argv
    }

    /// `LD OPT_LNK -o output objects... [OBJ_MPI] LINK_LIBS [NC_LIB]`
    ///
    /// Libraries come after the objects that need them.
    pub fn link_args(&self, objects: &[String], output: &str) -> Vec<String> {
        let mut argv = self.toolchain().linker().argv();
        argv.extend(self.optimization().link_flags().iter().cloned());
        argv.extend(["-o".to_string(), output.to_string()]);
        argv.extend(objects.iter().cloned());
        argv.extend(self.mpi().stub_objects().iter().cloned());
        argv.extend(self.linkage().tokens());
        if let Some(nc) = self.netcdf() {
            argv.extend(nc.link_args().iter().cloned());
        }
        argv
    }

    /// `AR AR_SPEC -r archive objects...`
    pub fn archive_args(&self, archive: &str, objects: &[String]) -> Vec<String> {
        let mut argv = self.toolchain().archiver().argv();
        argv.extend(self.archive().archiver_flags().iter().cloned());
        argv.extend(["-r".to_string(), archive.to_string()]);
        argv.extend(objects.iter().cloned());
        argv
    }

    /// `RANLIB RAN_SPEC archive`
    pub fn ranlib_args(&self, archive: &str) -> Vec<String> {
        let mut argv = self.toolchain().ranlib().argv();
        argv.extend(self.archive().ranlib_flags().iter().cloned());
        argv.push(archive.to_string());
        argv
    }

    /// `CPP -P -traditional CPP_DEFS source output`; `None` without a CPP tool.
    pub fn preprocess_args(&self, source: &str, output: &str) -> Option<Vec<String>> {
        let mut argv = self.toolchain().preprocessor()?.argv();
        argv.extend(["-P".to_string(), "-traditional".to_string()]);
        argv.extend(self.defines().tokens());
        argv.extend([source.to_string(), output.to_string()]);
        Some(argv)
    }
}
