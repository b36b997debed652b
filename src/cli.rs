use clap::Parser;

use crate::error::Result;
use crate::pipeline::PipelineConfig;

#[derive(Parser, Debug)]
#[command(name = "dnuz")]
#[command(version)]
#[command(about = "Download & unzip & fix non-UTF-8 paths/filenames", long_about = None)]
#[command(after_help = "Supported encodings: 866 (cp866), 1251 (windows-1251)\n\n\
Examples:\n  \
  dnuz --src-url https://example.com/old.zip --out-path out --non-utf8-enc cp866\n  \
  dnuz --src-url https://example.com/old.zip --non-utf8-enc 866 --out-enc 1251")]
pub struct Cli {
    /// Source file url (a local path is accepted too)
    #[arg(long = "src-url", value_name = "URL", env = "DNUZ_SRC_URL", default_value = "")]
    pub src_url: String,

    /// Output path
    #[arg(long = "out-path", value_name = "DIR", env = "DNUZ_OUT_PATH", default_value = "")]
    pub out_path: String,

    /// Encoding name for non-UTF-8 filenames
    #[arg(
        long = "non-utf8-enc",
        visible_alias = "nonUtf8-enc",
        value_name = "NAME",
        env = "DNUZ_NON_UTF8_ENC",
        default_value = ""
    )]
    pub non_utf8_enc: String,

    /// Encoding name for output filenames
    #[arg(long = "out-enc", value_name = "NAME", env = "DNUZ_OUT_ENC", default_value = "")]
    pub out_enc: String,

    /// Quiet mode, only errors are printed
    #[arg(short = 'q', long = "quiet")]
    pub quiet: bool,
}

impl Cli {
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn to_config(&self) -> Result<PipelineConfig> {
        PipelineConfig::new(&self.src_url, &self.out_path, &self.non_utf8_enc, &self.out_enc)
    }
}
