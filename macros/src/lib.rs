use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, parse_quote, spanned::Spanned, Ident, ItemFn, LitStr};

/// Test attribute used across the crate.
///
/// Sync functions become plain `#[test]`s, async functions run on tokio
/// (`#[completable_macro::test(shared)]` selects the multi-thread flavor).
/// Every test installs a `tracing-subscriber` writer that is captured by the
/// test harness, filtered by `RUST_LOG`.
#[proc_macro_attribute]
pub fn test(attr: TokenStream, item: TokenStream) -> TokenStream {
  let mut input = parse_macro_input!(item as ItemFn);

  let is_async = input.sig.asyncness.is_some();

  let raw_args = proc_macro2::TokenStream::from(attr);
  let flavor = if raw_args.is_empty() {
    None
  } else {
    if !is_async {
      return TokenStream::from(
        syn::Error::new(
          raw_args.span(),
          "completable_macro::test flavor args are only supported for async tests",
        )
        .to_compile_error(),
      );
    }

    let name = if let Ok(ident) = syn::parse2::<Ident>(raw_args.clone()) {
      ident.to_string()
    } else if let Ok(lit) = syn::parse2::<LitStr>(raw_args.clone()) {
      lit.value()
    } else {
      String::new()
    };

    match name.as_str() {
      "local" => Some(quote!(flavor = "current_thread")),
      "shared" => Some(quote!(flavor = "multi_thread", worker_threads = 4)),
      _ => {
        return TokenStream::from(
          syn::Error::new(
            raw_args.span(),
            "completable_macro::test only accepts: #[completable_macro::test], \
             #[completable_macro::test(local)] or #[completable_macro::test(shared)]",
          )
          .to_compile_error(),
        );
      }
    }
  };

  input.block.stmts.insert(
    0,
    parse_quote! {
      let _ = ::tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter(::tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    },
  );

  let test_attr = match (is_async, flavor) {
    (true, Some(flavor)) => quote!(#[::tokio::test(#flavor)]),
    (true, None) => quote!(#[::tokio::test]),
    (false, _) => quote!(#[test]),
  };

  let expanded = quote! {
      #test_attr
      #input
  };

  TokenStream::from(expanded)
}
