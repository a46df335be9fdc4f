//! Enumerated option values.
//!
//! Each enum knows its wire value and parses from either its name
//! (case-insensitive) or its wire value, so values coming from config files
//! or command lines are validated against the same allow-list.

use std::fmt;
use std::str::FromStr;

use crate::error::ApiError;

macro_rules! api_option {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            const ALL: &'static [($name, &'static str, &'static str)] =
                &[ $( ($name::$variant, stringify!($variant), $wire) ),+ ];

            /// Value sent to the API.
            pub fn as_param(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }

            fn allowed() -> String {
                Self::ALL
                    .iter()
                    .map(|(_, name, wire)| {
                        if name == wire {
                            name.to_string()
                        } else {
                            format!("{wire} ({name})")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl FromStr for $name {
            type Err = ApiError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let s = s.trim();
                Self::ALL
                    .iter()
                    .find(|(_, name, wire)| name.eq_ignore_ascii_case(s) || *wire == s)
                    .map(|(value, _, _)| *value)
                    .ok_or_else(|| {
                        ApiError::Validation(format!(
                            "Allowed values for {}: {}.",
                            $label,
                            Self::allowed()
                        ))
                    })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_param())
            }
        }
    };
}

api_option! {
    /// PDF page size.
    PageSize, "Page Size" {
        Custom => "Custom",
        A1 => "A1",
        A2 => "A2",
        A3 => "A3",
        A4 => "A4",
        A5 => "A5",
        Letter => "Letter",
        HalfLetter => "HalfLetter",
        Ledger => "Ledger",
        Legal => "Legal",
    }
}

api_option! {
    PageOrientation, "Page Orientation" {
        Portrait => "Portrait",
        Landscape => "Landscape",
    }
}

api_option! {
    /// Engine used to render the HTML.
    RenderingEngine, "Rendering Engine" {
        WebKit => "WebKit",
        /// WebKit without plugins, for untrusted content.
        Restricted => "Restricted",
        Blink => "Blink",
    }
}

api_option! {
    /// Protocol used to reach secure (https) pages.
    SecureProtocol, "Secure Protocol" {
        Tls11OrNewer => "0",
        Tls10 => "1",
        Ssl3 => "2",
    }
}

api_option! {
    /// Page layout used when the viewer opens the PDF.
    PageLayout, "Page Layout" {
        SinglePage => "0",
        OneColumn => "1",
        TwoColumnLeft => "2",
        TwoColumnRight => "3",
    }
}

api_option! {
    /// Panel shown when the viewer opens the PDF.
    PageMode, "Page Mode" {
        UseNone => "0",
        UseOutlines => "1",
        UseThumbs => "2",
        FullScreen => "3",
        UseOC => "4",
        UseAttachments => "5",
    }
}

api_option! {
    PageNumbersAlignment, "Page Numbers Alignment" {
        Left => "1",
        Center => "2",
        Right => "3",
    }
}

api_option! {
    /// When the converter decides the page is ready.
    StartupMode, "Startup Mode" {
        Automatic => "Automatic",
        /// Wait for the page to call `SelectPdf.startConversion()`.
        Manual => "Manual",
    }
}

api_option! {
    /// Format of text extracted from a PDF.
    OutputFormat, "Output Format" {
        Text => "0",
        Html => "1",
    }
}
