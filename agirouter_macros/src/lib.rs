use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, Fields, GenericArgument, LitStr, PathArguments, Type,
};

/// Conversion tag for a field type, as the path of a `ParamType` variant.
fn param_type_for(ty: &Type) -> proc_macro2::TokenStream {
    let Type::Path(p) = ty else {
        return quote! { ::agirouter::typed::ParamType::Json };
    };
    let Some(seg) = p.path.segments.last() else {
        return quote! { ::agirouter::typed::ParamType::Json };
    };

    if seg.ident == "Option" {
        if let PathArguments::AngleBracketed(args) = &seg.arguments {
            if let Some(GenericArgument::Type(inner)) = args.args.first() {
                return param_type_for(inner);
            }
        }
    }

    match seg.ident.to_string().as_str() {
        "i8" | "i16" | "i32" | "i64" | "i128" | "isize" | "u8" | "u16" | "u32" | "u64" | "u128"
        | "usize" => quote! { ::agirouter::typed::ParamType::Int },
        "f32" | "f64" => quote! { ::agirouter::typed::ParamType::Float },
        "bool" => quote! { ::agirouter::typed::ParamType::Bool },
        "String" | "char" => quote! { ::agirouter::typed::ParamType::Str },
        _ => quote! { ::agirouter::typed::ParamType::Json },
    }
}

/// Options read from `#[agi(...)]` on a field.
#[derive(Default)]
struct FieldAttrs {
    default: Option<LitStr>,
    model: bool,
}

/// Reads `#[agi(default = "...")]` and `#[agi(model)]` from a field.
fn field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut attrs = FieldAttrs::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("agi") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                attrs.default = Some(meta.value()?.parse::<LitStr>()?);
                Ok(())
            } else if meta.path.is_ident("model") {
                attrs.model = true;
                Ok(())
            } else {
                Err(meta.error("unsupported agi attribute, expected `default` or `model`"))
            }
        })?;
    }
    Ok(attrs)
}

fn is_option(ty: &Type) -> bool {
    matches!(ty, Type::Path(p) if p.path.segments.last().is_some_and(|s| s.ident == "Option"))
}

/// Named fields of a struct, or the error to report for anything else.
fn named_fields<'a>(
    input: &'a DeriveInput,
    derive: &str,
) -> syn::Result<&'a syn::punctuated::Punctuated<syn::Field, syn::token::Comma>> {
    match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(named) => Ok(&named.named),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                format!("{derive} can only be derived for structs with named fields"),
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            format!("{derive} can only be derived for structs"),
        )),
    }
}

/// Derives `agirouter::typed::ArgumentModel` for a struct with named fields.
///
/// Fields are mapped positionally, in declaration order. A field may carry
/// `#[agi(default = "raw")]`; the raw default goes through the same
/// conversion as a wire value.
#[proc_macro_derive(ArgumentModel, attributes(agi))]
pub fn derive_argument_model(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match named_fields(&input, "ArgumentModel") {
        Ok(fields) => fields,
        Err(e) => return e.to_compile_error().into(),
    };

    let mut field_defs = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(name) = field.ident.as_ref().map(|i| i.to_string()) else {
            continue;
        };
        let ty = param_type_for(&field.ty);
        let attrs = match field_attrs(field) {
            Ok(attrs) => attrs,
            Err(e) => return e.to_compile_error().into(),
        };
        if attrs.model {
            return syn::Error::new_spanned(field, "argument models cannot nest other models")
                .to_compile_error()
                .into();
        }
        let field_def = match attrs.default {
            Some(raw) => quote! {
                ::agirouter::typed::ModelField::new(#name, #ty).with_default(#raw)
            },
            None => quote! { ::agirouter::typed::ModelField::new(#name, #ty) },
        };
        field_defs.push(field_def);
    }

    let model_name = ident.to_string();
    let expanded = quote! {
        impl #impl_generics ::agirouter::typed::ArgumentModel for #ident #ty_generics #where_clause {
            fn model_name() -> &'static str {
                #model_name
            }

            fn fields() -> ::std::vec::Vec<::agirouter::typed::ModelField> {
                ::std::vec![#(#field_defs),*]
            }
        }
    };
    TokenStream::from(expanded)
}

/// Derives `agirouter::typed::CallParams` for a struct with named fields.
///
/// Each field becomes one route parameter, in declaration order:
///
/// - scalar fields take their conversion from the field type;
/// - `#[agi(default = "raw")]` declares a default;
/// - `Option<_>` fields without a default are optional and bind to `None`;
/// - `#[agi(model)]` fields consume a run of positional arguments through
///   the field type's `ArgumentModel` impl.
///
/// The struct must also implement `serde::Deserialize`; the bound values
/// are deserialized into it at dispatch.
#[proc_macro_derive(CallParams, attributes(agi))]
pub fn derive_call_params(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match named_fields(&input, "CallParams") {
        Ok(fields) => fields,
        Err(e) => return e.to_compile_error().into(),
    };

    let mut params = Vec::with_capacity(fields.len());
    for field in fields {
        let Some(name) = field.ident.as_ref().map(|i| i.to_string()) else {
            continue;
        };
        let attrs = match field_attrs(field) {
            Ok(attrs) => attrs,
            Err(e) => return e.to_compile_error().into(),
        };
        let field_ty = &field.ty;
        let param = match (attrs.model, attrs.default) {
            (true, Some(raw)) => {
                return syn::Error::new_spanned(raw, "model fields take their defaults from the model")
                    .to_compile_error()
                    .into()
            }
            (true, None) => quote! {
                ::agirouter::dispatcher::Param::model::<#field_ty>(#name)
            },
            (false, Some(raw)) => {
                let ty = param_type_for(field_ty);
                quote! { ::agirouter::dispatcher::Param::scalar(#name, #ty).with_default(#raw) }
            }
            (false, None) if is_option(field_ty) => {
                let ty = param_type_for(field_ty);
                quote! { ::agirouter::dispatcher::Param::scalar(#name, #ty).with_default(()) }
            }
            (false, None) => {
                let ty = param_type_for(field_ty);
                quote! { ::agirouter::dispatcher::Param::scalar(#name, #ty) }
            }
        };
        params.push(param);
    }

    let expanded = quote! {
        impl #impl_generics ::agirouter::typed::CallParams for #ident #ty_generics #where_clause {
            fn signature() -> ::agirouter::dispatcher::Signature {
                ::agirouter::dispatcher::Signature::new()
                    #(.param(#params))*
            }

            fn from_args(
                args: &::agirouter::dispatcher::BoundArgs,
            ) -> ::std::result::Result<Self, ::agirouter::typed::ParamsError> {
                ::agirouter::typed::deserialize_args(args)
            }
        }
    };
    TokenStream::from(expanded)
}
