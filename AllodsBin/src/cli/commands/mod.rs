use clap::Subcommand;
use std::path::PathBuf;

pub mod batch;
pub mod info;
pub mod mesh;
pub mod skeleton;
pub mod texture;

#[derive(Subcommand)]
pub enum Commands {
    /// Show what an XDB file describes (model or texture)
    Info {
        /// XDB file
        path: PathBuf,
    },

    /// Print the bone hierarchy of a model
    Skeleton {
        /// Geometry XDB file
        path: PathBuf,

        /// Include attachment slot bones
        #[arg(long)]
        slots: bool,
    },

    /// Decode a texture to DDS (and optionally PNG)
    Texture {
        /// Texture XDB file
        path: PathBuf,

        /// Output DDS file (defaults to the texture's .bin with a .dds extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write a PNG of the top level
        #[arg(long)]
        png: Option<PathBuf>,

        /// Resource root (derived from the binaryFile href if omitted)
        #[arg(long)]
        base_dir: Option<PathBuf>,

        /// Fail if the inflated stream exceeds this many bytes
        #[arg(long)]
        max_size: Option<usize>,

        /// Log block pattern statistics (trace level)
        #[arg(long)]
        scan: bool,
    },

    /// Assemble model LODs and write them as JSON
    Mesh {
        /// Geometry XDB file
        path: PathBuf,

        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,

        /// LOD to assemble
        #[arg(long, default_value_t = 0, conflicts_with = "all_lods")]
        lod: usize,

        /// Assemble every LOD
        #[arg(long)]
        all_lods: bool,

        /// Include attachment slot bones
        #[arg(long)]
        slots: bool,

        /// Skip diffuse texture decoding
        #[arg(long)]
        no_textures: bool,
    },

    /// Decode every texture XDB under a directory, in parallel
    #[command(name = "batch-textures")]
    BatchTextures {
        /// Directory to scan recursively
        dir: PathBuf,

        /// Also write PNG files
        #[arg(long)]
        png: bool,

        /// Suppress per-file output
        #[arg(short, long)]
        quiet: bool,
    },
}

impl Commands {
    /// Execute the selected command.
    ///
    /// # Errors
    /// Returns an error if the underlying command fails.
    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Info { path } => info::execute(path),
            Commands::Skeleton { path, slots } => skeleton::execute(path, *slots),
            Commands::Texture {
                path,
                output,
                png,
                base_dir,
                max_size,
                scan,
            } => texture::execute(
                path,
                output.as_deref(),
                png.as_deref(),
                base_dir.as_deref(),
                *max_size,
                *scan,
            ),
            Commands::Mesh {
                path,
                output,
                lod,
                all_lods,
                slots,
                no_textures,
            } => mesh::execute(path, output, *lod, *all_lods, *slots, *no_textures),
            Commands::BatchTextures { dir, png, quiet } => batch::execute(dir, *png, *quiet),
        }
    }
}
